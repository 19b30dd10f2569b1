//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};

use custos_types::{AccountAddress, MarketParams};
use custos_utils::LogFormat;

use crate::EngineError;

/// Configuration for a Custos market engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The administrator account. Also receives the platform fee.
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Percentage of each completed order's price retained by the platform.
    #[serde(default = "default_fee_percent")]
    pub platform_fee_percent: u8,

    /// Refund window in seconds after payment (deadline inclusive).
    #[serde(default = "default_refund_window")]
    pub refund_window_secs: u64,

    /// Seconds after delivery before anyone may trigger completion.
    #[serde(default = "default_grace")]
    pub auto_complete_grace_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_admin() -> String {
    "cst_admin".to_string()
}

fn default_fee_percent() -> u8 {
    MarketParams::market_defaults().platform_fee_percent
}

fn default_refund_window() -> u64 {
    MarketParams::market_defaults().refund_window_secs
}

fn default_grace() -> u64 {
    MarketParams::market_defaults().auto_complete_grace_secs
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("EngineConfig is always serializable to TOML")
    }

    /// The validated administrator address.
    pub fn admin_address(&self) -> Result<AccountAddress, EngineError> {
        self.validate()?;
        Ok(AccountAddress::new(self.admin.clone()))
    }

    /// Install the global tracing subscriber this config describes.
    ///
    /// Call once at process startup; panics if a subscriber is already set
    /// (tests use `custos_utils::try_init_logging` instead).
    pub fn init_logging(&self) {
        custos_utils::init_logging(LogFormat::from_config(&self.log_format), &self.log_level);
    }

    /// The market policy values this configuration describes.
    pub fn params(&self) -> MarketParams {
        MarketParams {
            platform_fee_percent: self.platform_fee_percent,
            refund_window_secs: self.refund_window_secs,
            auto_complete_grace_secs: self.auto_complete_grace_secs,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.admin.starts_with(AccountAddress::PREFIX)
            || self.admin.len() <= AccountAddress::PREFIX.len()
        {
            return Err(EngineError::Config(format!(
                "admin address {:?} must start with {}",
                self.admin,
                AccountAddress::PREFIX
            )));
        }
        if self.platform_fee_percent > 100 {
            return Err(EngineError::Config(format!(
                "platform_fee_percent {} exceeds 100",
                self.platform_fee_percent
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            platform_fee_percent: default_fee_percent(),
            refund_window_secs: default_refund_window(),
            auto_complete_grace_secs: default_grace(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
