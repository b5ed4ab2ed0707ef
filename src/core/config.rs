//! Scan configuration

use crate::core::error::ConfigError;
use crate::core::settings::{
    CLOSE_TYPES, DEFAULT_DELAY_MS, DIFF_TOLERANCE, LOWER_RATIO_BOUND,
    MAX_DIFFLIB_SEQUENCE_LENGTH, SIMILARITY_RATIO, UPPER_RATIO_BOUND,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for one engine instance.
///
/// Every field has a default, so a TOML file only needs the keys it overrides:
///
/// ```toml
/// similarity_ratio = 0.85
/// delay_ms = 250
/// seed = 7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub similarity_ratio: f64,
    pub upper_ratio_bound: f64,
    pub lower_ratio_bound: f64,
    pub diff_tolerance: f64,
    /// Bodies above this many bytes skip the similarity diff
    pub max_comparison_len: usize,
    /// Pause between probe requests
    pub delay_ms: u64,
    pub close_types: Vec<String>,
    /// Fixed seed for probe values; `None` draws one per session
    pub seed: Option<u64>,
    /// Run the markup-reflection and file-inclusion hint probes
    pub non_sqli_checks: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            similarity_ratio: SIMILARITY_RATIO,
            upper_ratio_bound: UPPER_RATIO_BOUND,
            lower_ratio_bound: LOWER_RATIO_BOUND,
            diff_tolerance: DIFF_TOLERANCE,
            max_comparison_len: MAX_DIFFLIB_SEQUENCE_LENGTH,
            delay_ms: DEFAULT_DELAY_MS,
            close_types: CLOSE_TYPES.iter().map(|c| c.to_string()).collect(),
            seed: None,
            non_sqli_checks: true,
            request_timeout_secs: 10,
            user_agent: format!("sqlheur/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ScanConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 <= self.lower_ratio_bound
            && self.lower_ratio_bound < self.similarity_ratio
            && self.similarity_ratio < self.upper_ratio_bound
            && self.upper_ratio_bound <= 1.0;
        if !ordered {
            return Err(ConfigError::RatioOrder {
                lower: self.lower_ratio_bound,
                similarity: self.similarity_ratio,
                upper: self.upper_ratio_bound,
            });
        }
        if !(self.diff_tolerance > 0.0 && self.diff_tolerance < 1.0) {
            return Err(ConfigError::DiffTolerance(self.diff_tolerance));
        }
        if self.max_comparison_len == 0 {
            return Err(ConfigError::ZeroComparisonLength);
        }
        if self.close_types.is_empty() {
            return Err(ConfigError::NoCloseTypes);
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Config with no inter-request delay and a fixed seed
    pub fn deterministic(seed: u64) -> Self {
        Self {
            delay_ms: 0,
            seed: Some(seed),
            ..Self::default()
        }
    }
}
