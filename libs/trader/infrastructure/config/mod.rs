//! Engine configuration.
//!
//! A YAML file describes everything tunable; API credentials only ever
//! come from the environment (`.env` supported) so they never land in
//! version control.

use crate::domain::CandleInterval;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    File(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("environment variable not set: {0}")]
    EnvVarMissing(String),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub exchange: ExchangeConfig,
    pub trading: TradingConfig,
    pub jobs: JobsConfig,
    pub volatility: VolatilityConfig,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// API key from the environment (not in YAML).
    #[serde(skip)]
    pub api_key: String,

    /// API secret from the environment (not in YAML).
    #[serde(skip)]
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub rest_url: String,
    pub ws_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Pricing currency for every cycle (e.g. USDT).
    pub quote_asset: String,
    /// Asset the exchange charges fees in (e.g. BNB); never traded for
    /// profit, only topped up.
    pub fee_asset: String,
    /// Target profit per cycle, in percent.
    pub profit_ratio_pct: Decimal,
    /// Minimum size of one order, in quote terms.
    pub min_order_size: Decimal,
    /// Open orders older than this are cancelled.
    pub order_expiration_mins: u64,
    /// Quote value of the fee-asset balance below which a top-up market
    /// order is placed.
    pub fee_top_up_threshold: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_maintenance_secs")]
    pub maintenance_secs: u64,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_volatility_secs")]
    pub volatility_secs: u64,
    #[serde(default = "default_stream_health_secs")]
    pub stream_health_secs: u64,
    /// Soft per-run budget; an overrunning job is logged, not killed.
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,
    /// Push-connection idle threshold before a forced reset.
    #[serde(default = "default_stream_max_idle_secs")]
    pub stream_max_idle_secs: u64,
    /// Trading-rules snapshot TTL.
    #[serde(default = "default_rules_ttl_secs")]
    pub rules_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    pub candle_interval: CandleInterval,
    /// Number of candles in the scoring window.
    pub window: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_maintenance_secs() -> u64 {
    60
}

fn default_refresh_secs() -> u64 {
    300
}

fn default_volatility_secs() -> u64 {
    600
}

fn default_stream_health_secs() -> u64 {
    60
}

fn default_run_budget_secs() -> u64 {
    45
}

fn default_stream_max_idle_secs() -> u64 {
    120
}

fn default_rules_ttl_secs() -> u64 {
    300
}

impl EngineConfig {
    /// Load configuration from a YAML file plus `.env` credentials.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: EngineConfig = serde_yaml::from_str(&yaml_content)?;

        dotenv::dotenv().ok();

        config.api_key = std::env::var("API_KEY")
            .map_err(|_| ConfigError::EnvVarMissing("API_KEY".to_string()))?;
        config.api_secret = std::env::var("API_SECRET")
            .map_err(|_| ConfigError::EnvVarMissing("API_SECRET".to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML without touching the environment.
    /// Credentials stay empty; used by tests.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange.rest_url.is_empty() {
            return Err(ConfigError::Validation("rest_url cannot be empty".into()));
        }
        if self.exchange.ws_url.is_empty() {
            return Err(ConfigError::Validation("ws_url cannot be empty".into()));
        }
        if self.trading.quote_asset.is_empty() {
            return Err(ConfigError::Validation("quote_asset cannot be empty".into()));
        }
        if self.trading.fee_asset.is_empty() {
            return Err(ConfigError::Validation("fee_asset cannot be empty".into()));
        }
        if self.trading.profit_ratio_pct <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "profit_ratio_pct must be greater than 0".into(),
            ));
        }
        if self.trading.min_order_size <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "min_order_size must be greater than 0".into(),
            ));
        }
        if self.trading.order_expiration_mins == 0 {
            return Err(ConfigError::Validation(
                "order_expiration_mins must be greater than 0".into(),
            ));
        }
        if self.trading.fee_top_up_threshold < Decimal::ZERO {
            return Err(ConfigError::Validation(
                "fee_top_up_threshold cannot be negative".into(),
            ));
        }

        let intervals = [
            ("maintenance_secs", self.jobs.maintenance_secs),
            ("refresh_secs", self.jobs.refresh_secs),
            ("volatility_secs", self.jobs.volatility_secs),
            ("stream_health_secs", self.jobs.stream_health_secs),
            ("run_budget_secs", self.jobs.run_budget_secs),
            ("stream_max_idle_secs", self.jobs.stream_max_idle_secs),
            ("rules_ttl_secs", self.jobs.rules_ttl_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.volatility.window < 2 {
            return Err(ConfigError::Validation(
                "volatility window must cover at least 2 candles".into(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary.
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Quote asset: {}", self.trading.quote_asset);
        info!("  Fee asset: {}", self.trading.fee_asset);
        info!("  Profit ratio: {}%", self.trading.profit_ratio_pct);
        info!("  Min order size: {}", self.trading.min_order_size);
        info!(
            "  Order expiration: {} minutes",
            self.trading.order_expiration_mins
        );
        info!(
            "  Job intervals: maintenance {}s, refresh {}s, volatility {}s, stream health {}s",
            self.jobs.maintenance_secs,
            self.jobs.refresh_secs,
            self.jobs.volatility_secs,
            self.jobs.stream_health_secs
        );
        info!("  Log level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EXAMPLE: &str = r#"
exchange:
  rest_url: https://api.example.com
  ws_url: wss://stream.example.com
trading:
  quote_asset: USDT
  fee_asset: BNB
  profit_ratio_pct: "1.0"
  min_order_size: "15"
  order_expiration_mins: 60
  fee_top_up_threshold: "5"
jobs:
  maintenance_secs: 60
  refresh_secs: 300
  volatility_secs: 600
  stream_health_secs: 60
volatility:
  candle_interval: "15m"
  window: 96
log_level: info
"#;

    #[test]
    fn example_yaml_parses_and_validates() {
        let config = EngineConfig::from_yaml(EXAMPLE).unwrap();
        assert_eq!(config.trading.quote_asset, "USDT");
        assert_eq!(config.trading.profit_ratio_pct, dec!(1.0));
        assert_eq!(config.jobs.refresh_secs, 300);
        assert_eq!(config.jobs.run_budget_secs, 45); // default
        assert_eq!(config.volatility.window, 96);
    }

    #[test]
    fn zero_min_order_size_fails_validation() {
        let yaml = EXAMPLE.replace("min_order_size: \"15\"", "min_order_size: \"0\"");
        assert!(matches!(
            EngineConfig::from_yaml(&yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let yaml = EXAMPLE.replace("log_level: info", "log_level: loud");
        assert!(matches!(
            EngineConfig::from_yaml(&yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_reads_file_and_env_credentials() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        std::env::set_var("API_KEY", "test-key");
        std::env::set_var("API_SECRET", "test-secret");

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.api_secret, "test-secret");
        assert_eq!(config.trading.fee_asset, "BNB");
    }
}
