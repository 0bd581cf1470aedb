// crates/bami-core/src/error.rs

use thiserror::Error;

/// Engine-wide error type for the Bami farm.
///
/// Every variant aborts the operation that produced it. Callers going through
/// `FarmRuntime` get the pre-call state back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    /// Caller lacks the authority required by an owner-gated operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Reference to a pool (or other record) that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Withdrawal exceeds the stake recorded for the position.
    #[error("Insufficient stake: requested {requested} but only {staked} staked")]
    InsufficientStake { requested: u128, staked: u128 },

    /// Burn or transfer exceeds the recorded balance or allowance.
    #[error("Insufficient balance: requested {requested} but only {available} available")]
    InsufficientBalance { requested: u128, available: u128 },

    /// Arithmetic would leave the representable range.
    #[error("Arithmetic overflow in {0}")]
    Overflow(String),

    /// A pool for this stake asset already exists.
    #[error("Duplicate pool: {0}")]
    DuplicatePool(String),

    /// A parameter is outside its allowed range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FarmError {
    /// Shorthand for an overflow raised by the named operation.
    pub fn overflow(op: &str) -> Self {
        FarmError::Overflow(op.to_string())
    }
}

impl From<serde_json::Error> for FarmError {
    fn from(e: serde_json::Error) -> Self {
        FarmError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for FarmError {
    fn from(e: toml::de::Error) -> Self {
        FarmError::Config(e.to_string())
    }
}

impl From<std::io::Error> for FarmError {
    fn from(e: std::io::Error) -> Self {
        FarmError::Config(e.to_string())
    }
}
