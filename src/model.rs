// Core structs: SalesRecord, ProductDataset, MonthKey, Metrics, TrendResult
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product: String,
    pub branch: String,
    pub year: i32,
    pub month: u32,
    pub units_sold: f64,
    pub total_revenue: f64,
    pub total_cost: f64,
}

impl SalesRecord {
    /// Calendar month this record belongs to.
    pub fn month_key(&self) -> Result<MonthKey, AnalyticsError> {
        MonthKey::new(self.year, self.month)
    }

    /// False if units, revenue or cost is NaN or infinite.
    pub fn has_finite_values(&self) -> bool {
        self.units_sold.is_finite() && self.total_revenue.is_finite() && self.total_cost.is_finite()
    }
}

/// Records of a single product, borrowed from the full dataset.
#[derive(Debug, Clone)]
pub struct ProductDataset<'a> {
    product: String,
    records: Vec<&'a SalesRecord>,
}

impl<'a> ProductDataset<'a> {
    /// Fails with `InvalidInput` if any record belongs to another product.
    pub fn new(product: impl Into<String>, records: Vec<&'a SalesRecord>) -> Result<Self, AnalyticsError> {
        let product = product.into();
        if let Some(stray) = records.iter().find(|r| r.product != product) {
            return Err(AnalyticsError::InvalidInput(format!(
                "record for product '{}' in dataset of '{}'",
                stray.product, product
            )));
        }
        Ok(Self { product, records })
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn records(&self) -> &[&'a SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A calendar month. Ordering is chronological (year, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, AnalyticsError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AnalyticsError::InvalidInput(format!(
                "invalid month {}-{}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month, the date a point is plotted at.
    pub fn first_day(&self) -> NaiveDate {
        // validated in `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("MonthKey", 3)?;
        state.serialize_field("year", &self.year)?;
        state.serialize_field("month", &self.month)?;
        state.serialize_field("first_day", &self.first_day())?;
        state.end()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: MonthKey,
    pub units_sold: f64,
}

/// Units sold per month, strictly increasing by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySeries {
    pub points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn months(&self) -> Vec<MonthKey> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn units(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.units_sold).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub average_price: f64,
    pub average_margin_pct: f64,
    pub total_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub series: MonthlySeries,
    /// One fitted value per point of `series`, same order.
    pub predicted: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
}

/// Metrics persisted from an earlier run.
#[derive(Debug, Clone)]
pub struct StoredMetrics {
    pub product: String,
    pub scope: String,
    pub metrics: Metrics,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divisor {
    UnitsSold,
    TotalRevenue,
}

impl fmt::Display for Divisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divisor::UnitsSold => f.write_str("total units sold"),
            Divisor::TotalRevenue => f.write_str("total revenue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("division by zero: {0} is zero")]
    DivisionByZero(Divisor),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
}
