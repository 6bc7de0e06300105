use futures::future::join_all;
use sales_pulse::analyzer::AnalyzerImpl;
use sales_pulse::config::{load_config, AppConfig};
use sales_pulse::loader::{CsvLoader, RecordSource};
use sales_pulse::pipeline::{analyze_all, BranchFilter, ProductAnalysis};
use sales_pulse::report::{page_title, process_product, render_card, write_export, ProductReport};
use sales_pulse::storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let loader = CsvLoader::new(&config.data_path);
    let records = match loader.load().await {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to load sales data: {}", e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    let filter = BranchFilter::from_config(config.branch.as_deref());
    let analyzer = AnalyzerImpl::new();
    let analyses = analyze_all(&analyzer, &records, &filter);
    info!("Products to report: {}", analyses.len());

    println!("{}\n", page_title(&filter));

    let tasks: Vec<_> = analyses
        .into_iter()
        .map(|analysis| process_product_locked(analysis, filter.scope(), storage.clone()))
        .collect();
    let reports = join_all(tasks).await;

    for report in &reports {
        println!("{}", render_card(report, &config.currency_symbol));
    }

    match storage.lock().await.list_metrics(filter.scope()) {
        Ok(history) => info!("Products with stored history for {}: {}", filter.scope(), history.len()),
        Err(e) => warn!("History listing failed: {}", e),
    }

    if let Some(path) = &config.export_path {
        match write_export(path, &reports) {
            Ok(()) => info!("Exported {} products to {}", reports.len(), path),
            Err(e) => warn!("Export failed: {}", e),
        }
    }
}

async fn process_product_locked(
    analysis: ProductAnalysis,
    scope: &str,
    storage: Arc<Mutex<SqliteStorage>>,
) -> ProductReport {
    let storage = storage.lock().await;
    process_product(analysis, scope, &storage)
}
