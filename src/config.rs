use serde::Deserialize;
use std::fs;

fn default_db_path() -> String {
    "data.db".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// CSV file with the sales records.
    pub data_path: String,
    /// Branch to report on. `None`, "all" or "Todos" means every branch.
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub export_path: Option<String>,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}
