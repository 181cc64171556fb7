//! `serde`-derived shape of the on-disk/TOML configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_max_depth() -> usize {
    4
}

fn default_time_between_sequences() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9090".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_journal_path() -> String {
    "data/journal.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_metrics_addr(),
            path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_path")]
    pub path: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
        }
    }
}

/// Root configuration, loaded from TOML with `ARB_`-prefixed,
/// double-underscore-nested environment overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub order_max_amount: Decimal,
    pub min_profit: Decimal,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    pub exchanges: Vec<String>,
    pub enabled_currencies: Vec<String>,

    #[serde(default)]
    pub allow_sequential_sequences: bool,
    #[serde(default)]
    pub multiple_sequences: bool,
    #[serde(default)]
    pub maximum_sequences: u32,
    #[serde(default = "default_time_between_sequences")]
    pub time_between_sequences: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}
