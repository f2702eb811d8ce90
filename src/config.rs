use serde::{Deserialize, Serialize};

use crate::domain::MAX_POINTS;

/// Environment variable overriding [`LedgerConfig::max_points`]
pub const MAX_POINTS_ENV: &str = "POINT_LEDGER_MAX_POINTS";

/// Environment variable overriding [`LedgerConfig::strict_reads`]
pub const STRICT_READS_ENV: &str = "POINT_LEDGER_STRICT_READS";

/// Runtime settings of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Inclusive upper bound of any balance (default: 1,000,000,000)
    pub max_points: u64,

    /// Serialize balance and history reads with mutations on the same user (default: true)
    ///
    /// When disabled, reads go straight to the stores and may observe a balance whose history
    /// record is not appended yet.
    pub strict_reads: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_points: MAX_POINTS,
            strict_reads: true,
        }
    }
}

impl LedgerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_points(mut self, max_points: u64) -> Self {
        self.max_points = max_points;
        self
    }

    #[must_use]
    pub fn with_strict_reads(mut self, strict_reads: bool) -> Self {
        self.strict_reads = strict_reads;
        self
    }

    /// Configuration from the environment, with defaults for unset variables
    ///
    /// A variable that is set but cannot be parsed is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(MAX_POINTS_ENV) {
            config.max_points = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: MAX_POINTS_ENV,
                value,
            })?;
        }

        if let Some(value) = lookup(STRICT_READS_ENV) {
            config.strict_reads = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: STRICT_READS_ENV,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds an unparsable value
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        key: &'static str,
        value: String,
    },
}
