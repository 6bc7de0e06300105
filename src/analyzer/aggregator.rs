use crate::model::{AnalyticsError, Divisor, Metrics, ProductDataset};
use tracing::debug;

/// Calculates average price, average margin and total units over all records
/// of one product.
///
/// Price is checked before margin: a dataset with neither units nor revenue
/// reports `DivisionByZero(UnitsSold)`.
pub fn compute_metrics(records: &ProductDataset<'_>) -> Result<Metrics, AnalyticsError> {
    if records.is_empty() {
        return Err(AnalyticsError::InvalidInput(format!(
            "no records for product '{}'",
            records.product()
        )));
    }
    if let Some(bad) = records
        .records()
        .iter()
        .find(|r| !r.has_finite_values() || r.units_sold < 0.0)
    {
        return Err(AnalyticsError::InvalidInput(format!(
            "record {}-{} of product '{}' has units {}, revenue {}, cost {}",
            bad.year,
            bad.month,
            records.product(),
            bad.units_sold,
            bad.total_revenue,
            bad.total_cost
        )));
    }

    let total_units: f64 = records.records().iter().map(|r| r.units_sold).sum();
    let revenue: f64 = records.records().iter().map(|r| r.total_revenue).sum();
    let cost: f64 = records.records().iter().map(|r| r.total_cost).sum();

    if !(total_units.is_finite() && revenue.is_finite() && cost.is_finite()) {
        return Err(AnalyticsError::InvalidInput(format!(
            "totals overflow for product '{}'",
            records.product()
        )));
    }
    if total_units == 0.0 {
        return Err(AnalyticsError::DivisionByZero(Divisor::UnitsSold));
    }
    if revenue == 0.0 {
        return Err(AnalyticsError::DivisionByZero(Divisor::TotalRevenue));
    }

    let metrics = Metrics {
        average_price: revenue / total_units,
        average_margin_pct: (revenue - cost) / revenue * 100.0,
        total_units,
    };
    if !(metrics.average_price.is_finite() && metrics.average_margin_pct.is_finite()) {
        return Err(AnalyticsError::InvalidInput(format!(
            "metrics out of range for product '{}'",
            records.product()
        )));
    }
    debug!(product = records.product(), ?metrics, "metrics computed");
    Ok(metrics)
}
