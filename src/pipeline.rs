// Orchestration: branch filter, per-product partitioning, per-product analysis.
use crate::analyzer::Analyzer;
use crate::model::{AnalyticsError, Metrics, ProductDataset, SalesRecord, TrendResult};
use std::collections::HashMap;
use tracing::warn;

/// Which branches a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchFilter {
    All,
    Only(String),
}

impl BranchFilter {
    /// "all" and "Todos" (any case) or no value select every branch.
    pub fn from_config(branch: Option<&str>) -> Self {
        match branch.map(str::trim) {
            None | Some("") => BranchFilter::All,
            Some(name) if name.eq_ignore_ascii_case("all") || name.eq_ignore_ascii_case("todos") => {
                BranchFilter::All
            }
            Some(name) => BranchFilter::Only(name.to_string()),
        }
    }

    /// Key under which metrics of this run are stored.
    pub fn scope(&self) -> &str {
        match self {
            BranchFilter::All => "all",
            BranchFilter::Only(name) => name,
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        match self {
            BranchFilter::All => true,
            BranchFilter::Only(name) => record.branch == *name,
        }
    }
}

pub fn filter_branch<'a>(records: &'a [SalesRecord], filter: &BranchFilter) -> Vec<&'a SalesRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// Splits records by product, keeping products in order of first appearance
/// and records in input order.
pub fn partition_by_product<'a>(records: &[&'a SalesRecord]) -> Vec<ProductDataset<'a>> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut grouped: HashMap<&'a str, Vec<&'a SalesRecord>> = HashMap::new();

    for &record in records {
        let entry = grouped.entry(record.product.as_str()).or_insert_with(|| {
            order.push(record.product.as_str());
            Vec::new()
        });
        entry.push(record);
    }

    order
        .into_iter()
        .filter_map(|product| {
            let rows = grouped.remove(product)?;
            // all rows share `product` by construction
            ProductDataset::new(product, rows).ok()
        })
        .collect()
}

/// Outcome of analyzing one product. Metrics and trend fail independently.
#[derive(Debug, Clone)]
pub struct ProductAnalysis {
    pub product: String,
    pub metrics: Result<Metrics, AnalyticsError>,
    pub trend: Result<TrendResult, AnalyticsError>,
}

pub fn analyze_product(analyzer: &dyn Analyzer, dataset: &ProductDataset<'_>) -> ProductAnalysis {
    let metrics = analyzer.compute_metrics(dataset);
    if let Err(e) = &metrics {
        warn!("Metrics failed for {}: {}", dataset.product(), e);
    }
    let trend = analyzer.compute_trend(dataset);
    if let Err(e) = &trend {
        warn!("Trend failed for {}: {}", dataset.product(), e);
    }

    ProductAnalysis {
        product: dataset.product().to_string(),
        metrics,
        trend,
    }
}

/// Filters, partitions and analyzes every product. A failing product does not
/// stop the others.
pub fn analyze_all(
    analyzer: &dyn Analyzer,
    records: &[SalesRecord],
    filter: &BranchFilter,
) -> Vec<ProductAnalysis> {
    let selected = filter_branch(records, filter);
    partition_by_product(&selected)
        .iter()
        .map(|dataset| analyze_product(analyzer, dataset))
        .collect()
}
