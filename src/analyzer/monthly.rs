use crate::model::{AnalyticsError, MonthKey, MonthlyPoint, MonthlySeries, ProductDataset};
use std::collections::BTreeMap;

/// Sums units sold per calendar month, oldest month first.
///
/// Records falling in the same month are merged into one point, so the
/// result never holds a month twice.
pub fn monthly_units(records: &ProductDataset<'_>) -> Result<MonthlySeries, AnalyticsError> {
    let mut grouped: BTreeMap<MonthKey, f64> = BTreeMap::new();

    for record in records.records() {
        let key = record.month_key()?;
        *grouped.entry(key).or_insert(0.0) += record.units_sold;
    }

    let points = grouped
        .into_iter()
        .map(|(month, units_sold)| MonthlyPoint { month, units_sold })
        .collect();

    Ok(MonthlySeries { points })
}
