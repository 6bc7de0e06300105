//! Per-product sales analytics: summary metrics and a monthly units trend.

pub mod analyzer;
pub mod config;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod storage;
