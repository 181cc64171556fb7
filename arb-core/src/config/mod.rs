//! Runtime configuration: a single `serde`-derived [`Config`] loaded from
//! TOML, with `ARB_`-prefixed, double-underscore-nested environment
//! overrides, validated once at startup.
//!
//! Unlike the const-generic, Cargo-feature-driven configuration of a
//! latency-sensitive hot path, this engine is I/O-bound on exchange
//! sockets rather than CPU-bound, so every setting — including what
//! would elsewhere be a compile-time risk limit — lives in this one
//! runtime-loaded struct.

pub mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::path::Path;

impl Config {
    /// Load and validate configuration from a TOML file, applying any
    /// `ARB_`-prefixed environment overrides on top.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        let mut config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {:?}", path.as_ref()))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        Self::load("config/default.toml")
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("ARB_ORDER_MAX_AMOUNT") {
            self.order_max_amount = v.parse().context("invalid ARB_ORDER_MAX_AMOUNT")?;
        }
        if let Ok(v) = std::env::var("ARB_MIN_PROFIT") {
            self.min_profit = v.parse().context("invalid ARB_MIN_PROFIT")?;
        }
        if let Ok(v) = std::env::var("ARB_MAX_DEPTH") {
            self.max_depth = v.parse().context("invalid ARB_MAX_DEPTH")?;
        }
        if let Ok(v) = std::env::var("ARB_MULTIPLE_SEQUENCES") {
            self.multiple_sequences = v.parse().context("invalid ARB_MULTIPLE_SEQUENCES")?;
        }
        if let Ok(v) = std::env::var("ARB_MAXIMUM_SEQUENCES") {
            self.maximum_sequences = v.parse().context("invalid ARB_MAXIMUM_SEQUENCES")?;
        }
        if let Ok(v) = std::env::var("ARB_LOGGING__LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("ARB_LOGGING__JSON") {
            self.logging.json = v.parse().context("invalid ARB_LOGGING__JSON")?;
        }
        if let Ok(v) = std::env::var("ARB_METRICS__ENABLED") {
            self.metrics.enabled = v.parse().context("invalid ARB_METRICS__ENABLED")?;
        }
        if let Ok(v) = std::env::var("ARB_METRICS__LISTEN_ADDR") {
            self.metrics.listen_addr = v;
        }
        if let Ok(v) = std::env::var("ARB_JOURNAL__PATH") {
            self.journal.path = v;
        }
        Ok(())
    }

    /// Validate configuration values; an invalid config aborts startup.
    pub fn validate(&self) -> Result<()> {
        if self.order_max_amount <= Decimal::ZERO {
            bail!("order_max_amount must be positive");
        }
        if self.min_profit < Decimal::ZERO {
            bail!("min_profit cannot be negative");
        }
        if self.max_depth < 2 {
            bail!("max_depth must be at least 2 to form a cycle");
        }
        if self.exchanges.is_empty() {
            bail!("at least one exchange must be configured");
        }
        if self.enabled_currencies.is_empty() {
            bail!("at least one currency must be enabled");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "invalid log level '{}', must be one of: {:?}",
                self.logging.level,
                valid_log_levels
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_config() -> Config {
        Config {
            order_max_amount: dec!(1000),
            min_profit: dec!(0.01),
            max_depth: 4,
            exchanges: vec!["alpha".into(), "beta".into()],
            enabled_currencies: vec!["BTC".into(), "USD".into()],
            allow_sequential_sequences: false,
            multiple_sequences: false,
            maximum_sequences: 0,
            time_between_sequences: 5,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            journal: JournalConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_order_max_amount() {
        let mut config = valid_config();
        config.order_max_amount = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_exchange_list() {
        let mut config = valid_config();
        config.exchanges.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "verbose".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_parses_toml_and_applies_defaults() {
        let toml_str = r#"
            order_max_amount = "1000"
            min_profit = "0.01"
            exchanges = ["alpha", "beta"]
            enabled_currencies = ["BTC", "USD"]
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }
}
