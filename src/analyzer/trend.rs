use crate::analyzer::monthly::monthly_units;
use crate::model::{AnalyticsError, ProductDataset, TrendResult};
use tracing::debug;

/// Fits a least-squares line to monthly units sold.
///
/// Months are indexed 0, 1, 2, ... in chronological order. A month missing
/// from the data does not leave a gap in the index, so the slope is "per
/// observed month", not per calendar month.
pub fn compute_trend(records: &ProductDataset<'_>) -> Result<TrendResult, AnalyticsError> {
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

    let series = monthly_units(records)?;
    let units = series.units();
    let (slope, intercept) = fit_line(&units);
    let predicted: Vec<f64> = (0..units.len())
        .map(|i| intercept + slope * i as f64)
        .collect();

    let finite = units.iter().chain(&predicted).all(|v| v.is_finite())
        && slope.is_finite()
        && intercept.is_finite();
    if !finite {
        return Err(AnalyticsError::InvalidInput(format!(
            "monthly units out of range for product '{}'",
            records.product()
        )));
    }

    debug!(
        product = records.product(),
        months = series.len(),
        slope,
        intercept,
        "trend fitted"
    );

    Ok(TrendResult {
        series,
        predicted,
        slope,
        intercept,
    })
}

/// Ordinary least squares of `y` against its index. Returns (slope, intercept).
/// A single point has zero variance in x: slope 0, intercept = the point.
fn fit_line(y: &[f64]) -> (f64, f64) {
    let n = y.len() as f64;
    let y_mean = y.iter().sum::<f64>() / n;
    if y.len() < 2 {
        return (0.0, y_mean);
    }

    let x_mean = (n - 1.0) / 2.0;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let xi = i as f64;
        num += (xi - x_mean) * (yi - y_mean);
        den += (xi - x_mean) * (xi - x_mean);
    }

    let slope = num / den;
    (slope, y_mean - slope * x_mean)
}
