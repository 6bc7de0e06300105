// Presentation: per-product cards, period-over-period deltas, JSON export.
use crate::model::{Metrics, ReportError, TrendResult};
use crate::pipeline::{BranchFilter, ProductAnalysis};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use tracing::{info, warn};

/// Change of each metric against the previous run of the same scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricDeltas {
    /// Percent change of the average price.
    pub price_pct: Option<f64>,
    /// Margin difference in percentage points.
    pub margin_points: Option<f64>,
    /// Percent change of total units.
    pub units_pct: Option<f64>,
}

impl MetricDeltas {
    pub fn between(current: &Metrics, previous: Option<&Metrics>) -> Self {
        let Some(previous) = previous else {
            return Self::default();
        };
        Self {
            price_pct: percent_change(current.average_price, previous.average_price),
            margin_points: Some(current.average_margin_pct - previous.average_margin_pct),
            units_pct: percent_change(current.total_units, previous.total_units),
        }
    }
}

fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductReport {
    pub product: String,
    pub scope: String,
    pub metrics: Option<Metrics>,
    pub deltas: MetricDeltas,
    pub trend: Option<TrendResult>,
    pub errors: Vec<String>,
}

impl ProductReport {
    pub fn new(analysis: ProductAnalysis, scope: &str, previous: Option<&Metrics>) -> Self {
        let mut errors = Vec::new();
        let metrics = match analysis.metrics {
            Ok(m) => Some(m),
            Err(e) => {
                errors.push(format!("metrics: {}", e));
                None
            }
        };
        let trend = match analysis.trend {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(format!("trend: {}", e));
                None
            }
        };
        let deltas = metrics
            .as_ref()
            .map(|m| MetricDeltas::between(m, previous))
            .unwrap_or_default();

        Self {
            product: analysis.product,
            scope: scope.to_string(),
            metrics,
            deltas,
            trend,
            errors,
        }
    }
}

/// Compares a product's metrics with the previous run of `scope` and stores
/// the new ones. Failed metrics leave the stored history untouched.
pub fn process_product(analysis: ProductAnalysis, scope: &str, storage: &SqliteStorage) -> ProductReport {
    let previous = match storage.get_metrics(&analysis.product, scope) {
        Ok(Some(prev)) => {
            info!(
                "Previous stats for {}: {:.2} avg price | Updated: {}",
                analysis.product, prev.metrics.average_price, prev.last_updated
            );
            Some(prev.metrics)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("History lookup failed for {}: {}", analysis.product, e);
            None
        }
    };

    if let Ok(metrics) = &analysis.metrics {
        if let Err(e) = storage.update_metrics(&analysis.product, scope, metrics) {
            warn!("Stats update failed for {}: {}", analysis.product, e);
        }
    }

    ProductReport::new(analysis, scope, previous.as_ref())
}

pub fn page_title(filter: &BranchFilter) -> String {
    match filter {
        BranchFilter::All => "Sales data for all branches".to_string(),
        BranchFilter::Only(name) => format!("Sales data for branch {}", name),
    }
}

/// Formats with thousands separators, e.g. `1234567.891` with 2 decimals
/// becomes `1,234,567.89`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

fn format_delta(delta: Option<f64>, unit: &str) -> String {
    match delta {
        Some(d) => format!(" ({:+.2}{})", d, unit),
        None => String::new(),
    }
}

pub fn render_card(report: &ProductReport, currency: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### {}", report.product);

    if let Some(m) = &report.metrics {
        let _ = writeln!(
            out,
            "Average price: {}{}{}",
            currency,
            format_number(m.average_price, 2),
            format_delta(report.deltas.price_pct, "%")
        );
        let _ = writeln!(
            out,
            "Average margin: {:.2}%{}",
            m.average_margin_pct,
            format_delta(report.deltas.margin_points, " pts")
        );
        let _ = writeln!(
            out,
            "Units sold: {}{}",
            format_number(m.total_units, 0),
            format_delta(report.deltas.units_pct, "%")
        );
    }

    if let Some(trend) = &report.trend {
        let _ = writeln!(out, "{:<8} {:>12} {:>12}", "Month", "Units", "Trend");
        for (point, predicted) in trend.series.points.iter().zip(&trend.predicted) {
            let _ = writeln!(
                out,
                "{:<8} {:>12} {:>12}",
                point.month.to_string(),
                format_number(point.units_sold, 0),
                format_number(*predicted, 1)
            );
        }
        let _ = writeln!(out, "Trend slope: {:+.2} units/month", trend.slope);
    }

    for error in &report.errors {
        let _ = writeln!(out, "Unavailable {}", error);
    }

    out
}

pub fn write_export(path: &str, reports: &[ProductReport]) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyticsError, Divisor, MonthKey, MonthlyPoint, MonthlySeries};

    fn metrics(price: f64, margin: f64, units: f64) -> Metrics {
        Metrics {
            average_price: price,
            average_margin_pct: margin,
            total_units: units,
        }
    }

    fn trend() -> TrendResult {
        TrendResult {
            series: MonthlySeries {
                points: vec![
                    MonthlyPoint { month: MonthKey::new(2023, 1).unwrap(), units_sold: 1200.0 },
                    MonthlyPoint { month: MonthKey::new(2023, 2).unwrap(), units_sold: 900.0 },
                ],
            },
            predicted: vec![1200.0, 900.0],
            slope: -300.0,
            intercept: 1200.0,
        }
    }

    #[test]
    fn deltas_against_previous_run() {
        let deltas = MetricDeltas::between(
            &metrics(11.0, 30.0, 150.0),
            Some(&metrics(10.0, 25.0, 200.0)),
        );
        assert!((deltas.price_pct.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(deltas.margin_points, Some(5.0));
        assert_eq!(deltas.units_pct, Some(-25.0));
    }

    #[test]
    fn no_previous_run_means_no_deltas() {
        assert_eq!(MetricDeltas::between(&metrics(1.0, 1.0, 1.0), None), MetricDeltas::default());
    }

    #[test]
    fn zero_previous_value_has_no_percent_change() {
        let deltas = MetricDeltas::between(&metrics(1.0, 1.0, 1.0), Some(&metrics(0.0, 1.0, 0.0)));
        assert_eq!(deltas.price_pct, None);
        assert_eq!(deltas.units_pct, None);
        assert_eq!(deltas.margin_points, Some(0.0));
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
        assert_eq!(format_number(-1234.5, 1), "-1,234.5");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn page_title_names_the_branch() {
        assert_eq!(page_title(&BranchFilter::All), "Sales data for all branches");
        assert_eq!(
            page_title(&BranchFilter::Only("Sucursal Sur".into())),
            "Sales data for branch Sucursal Sur"
        );
    }

    #[test]
    fn card_shows_metrics_deltas_and_months() {
        let analysis = ProductAnalysis {
            product: "Cola".into(),
            metrics: Ok(metrics(1250.5, 33.333, 2100.0)),
            trend: Ok(trend()),
        };
        let report = ProductReport::new(analysis, "all", Some(&metrics(1250.5, 30.0, 2000.0)));

        let card = render_card(&report, "$");

        assert!(card.starts_with("### Cola\n"));
        assert!(card.contains("Average price: $1,250.50 (+0.00%)"));
        assert!(card.contains("Average margin: 33.33% (+3.33 pts)"));
        assert!(card.contains("Units sold: 2,100 (+5.00%)"));
        assert!(card.contains("2023-01"));
        assert!(card.contains("2023-02"));
        assert!(card.contains("Trend slope: -300.00 units/month"));
    }

    #[test]
    fn card_reports_failed_metrics() {
        let analysis = ProductAnalysis {
            product: "Chips".into(),
            metrics: Err(AnalyticsError::DivisionByZero(Divisor::UnitsSold)),
            trend: Ok(trend()),
        };
        let report = ProductReport::new(analysis, "North", None);

        assert!(report.metrics.is_none());
        assert_eq!(report.errors.len(), 1);
        let card = render_card(&report, "€");
        assert!(!card.contains("Average price"));
        assert!(card.contains("Unavailable metrics: division by zero: total units sold is zero"));
    }

    fn analysis(product: &str, metrics: Result<Metrics, AnalyticsError>) -> ProductAnalysis {
        ProductAnalysis {
            product: product.into(),
            metrics,
            trend: Ok(trend()),
        }
    }

    #[test]
    fn first_run_has_no_deltas_and_second_run_does() {
        let storage = SqliteStorage::new(":memory:").unwrap();

        let first = process_product(analysis("Cola", Ok(metrics(10.0, 20.0, 100.0))), "all", &storage);
        assert_eq!(first.deltas, MetricDeltas::default());

        let second = process_product(analysis("Cola", Ok(metrics(12.0, 25.0, 150.0))), "all", &storage);
        assert!((second.deltas.price_pct.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(second.deltas.margin_points, Some(5.0));
        assert_eq!(second.deltas.units_pct, Some(50.0));

        let stored = storage.get_metrics("Cola", "all").unwrap().unwrap();
        assert_eq!(stored.metrics, metrics(12.0, 25.0, 150.0));
    }

    #[test]
    fn history_is_kept_per_scope() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        process_product(analysis("Cola", Ok(metrics(10.0, 20.0, 100.0))), "all", &storage);

        let north = process_product(analysis("Cola", Ok(metrics(11.0, 20.0, 100.0))), "North", &storage);

        assert_eq!(north.deltas, MetricDeltas::default());
    }

    #[test]
    fn failed_metrics_do_not_overwrite_history() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        process_product(analysis("Chips", Ok(metrics(5.0, 40.0, 30.0))), "all", &storage);

        let failed = process_product(
            analysis("Chips", Err(AnalyticsError::DivisionByZero(Divisor::UnitsSold))),
            "all",
            &storage,
        );
        assert!(failed.metrics.is_none());
        assert_eq!(failed.deltas, MetricDeltas::default());

        let stored = storage.get_metrics("Chips", "all").unwrap().unwrap();
        assert_eq!(stored.metrics, metrics(5.0, 40.0, 30.0));

        let recovered = process_product(analysis("Chips", Ok(metrics(5.0, 40.0, 60.0))), "all", &storage);
        assert_eq!(recovered.deltas.units_pct, Some(100.0));
    }

    #[test]
    fn export_is_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let analysis = ProductAnalysis {
            product: "Cola".into(),
            metrics: Ok(metrics(10.0, 20.0, 30.0)),
            trend: Ok(trend()),
        };
        let reports = vec![ProductReport::new(analysis, "all", None)];

        write_export(path.to_str().unwrap(), &reports).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["product"], "Cola");
        assert_eq!(value[0]["metrics"]["total_units"], 30.0);
        let month = &value[0]["trend"]["series"]["points"][1]["month"];
        assert_eq!(month["month"], 2);
        assert_eq!(month["first_day"], "2023-02-01");
    }
}
