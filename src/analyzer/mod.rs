// Analyzer module: per-product metrics and monthly trend.

pub mod aggregator;
pub mod monthly;
pub mod trend;

use crate::model::{AnalyticsError, Metrics, ProductDataset, TrendResult};

pub use aggregator::compute_metrics;
pub use monthly::monthly_units;
pub use trend::compute_trend;

/// Trait defining the interface for a product sales analyzer.
pub trait Analyzer: Send + Sync {
    fn compute_metrics(&self, records: &ProductDataset<'_>) -> Result<Metrics, AnalyticsError>;
    fn compute_trend(&self, records: &ProductDataset<'_>) -> Result<TrendResult, AnalyticsError>;
}

/// Default analyzer backed by the pure functions of this module.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AnalyzerImpl {
    fn compute_metrics(&self, records: &ProductDataset<'_>) -> Result<Metrics, AnalyticsError> {
        aggregator::compute_metrics(records)
    }

    fn compute_trend(&self, records: &ProductDataset<'_>) -> Result<TrendResult, AnalyticsError> {
        trend::compute_trend(records)
    }
}
