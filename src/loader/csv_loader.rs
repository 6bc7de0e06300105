use crate::loader::RecordSource;
use crate::model::{LoadError, SalesRecord};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// One CSV row as exported by the sales system. English headers are accepted
/// as aliases.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Producto", alias = "product")]
    product: String,
    #[serde(rename = "Sucursal", alias = "branch")]
    branch: String,
    #[serde(rename = "Año", alias = "year")]
    year: i32,
    #[serde(rename = "Mes", alias = "month")]
    month: u32,
    #[serde(rename = "Unidades_vendidas", alias = "units_sold")]
    units_sold: f64,
    #[serde(rename = "Ingreso_total", alias = "total_revenue")]
    total_revenue: f64,
    #[serde(rename = "Costo_total", alias = "total_cost")]
    total_cost: f64,
}

impl CsvRow {
    fn into_record(self) -> Result<SalesRecord, String> {
        if !(1..=12).contains(&self.month) {
            return Err(format!("month {} is outside 1-12", self.month));
        }
        if !self.units_sold.is_finite() || self.units_sold < 0.0 {
            return Err(format!("units sold must be a non-negative number, got {}", self.units_sold));
        }
        if !self.total_revenue.is_finite() || !self.total_cost.is_finite() {
            return Err("revenue and cost must be finite".to_string());
        }
        if self.product.is_empty() {
            return Err("product is empty".to_string());
        }

        Ok(SalesRecord {
            product: self.product,
            branch: self.branch,
            year: self.year,
            month: self.month,
            units_sold: self.units_sold,
            total_revenue: self.total_revenue,
            total_cost: self.total_cost,
        })
    }
}

pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parses CSV text. Row numbers in errors count data rows from 1.
    pub fn parse_csv(csv_data: &str) -> Result<Vec<SalesRecord>, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());
        reader.headers()?;

        let mut records = Vec::new();
        for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
            let row = index + 1;
            let raw = result.map_err(|e| LoadError::InvalidRow { row, reason: e.to_string() })?;
            let record = raw.into_record().map_err(|reason| LoadError::InvalidRow { row, reason })?;
            records.push(record);
        }

        Ok(records)
    }
}

#[async_trait::async_trait]
impl RecordSource for CsvLoader {
    async fn load(&self) -> Result<Vec<SalesRecord>, LoadError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records = Self::parse_csv(&content)?;
        info!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
