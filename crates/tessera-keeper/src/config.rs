//! Relay configuration.

use serde::{Deserialize, Serialize};
use tessera_core::types::{DEFAULT_MAX_PATH_LEN, DEFAULT_MAX_SIGNATURES};
use tessera_core::QuorumThreshold;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse relay config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid relay config: {reason}")]
    Invalid { reason: String },
}

/// Settings that govern anchoring and proof acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Fraction of the validator set that must sign a header (strictly greater than).
    pub quorum: QuorumThreshold,
    /// The only signer allowed to replace the validator set. `None` freezes it after genesis.
    pub authority: Option<String>,
    /// Longest inclusion path accepted before hashing.
    pub max_path_len: usize,
    /// Most signatures accepted in one anchor proof before any are verified.
    pub max_signatures: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            quorum: QuorumThreshold::TWO_THIRDS,
            authority: None,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            max_signatures: DEFAULT_MAX_SIGNATURES,
        }
    }
}

impl RelayConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let QuorumThreshold {
            numerator,
            denominator,
        } = self.quorum;
        if denominator == 0 {
            return Err(ConfigError::Invalid {
                reason: "quorum denominator must be positive".to_string(),
            });
        }
        // A zero numerator would let a single signature anchor anything;
        // numerator >= denominator could never be met.
        if numerator == 0 || numerator >= denominator {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "quorum fraction {}/{} must be strictly between 0 and 1",
                    numerator, denominator
                ),
            });
        }
        if self.max_path_len == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_path_len must be positive".to_string(),
            });
        }
        if self.max_signatures == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_signatures must be positive".to_string(),
            });
        }
        if matches!(self.authority.as_deref(), Some("")) {
            return Err(ConfigError::Invalid {
                reason: "authority must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}
