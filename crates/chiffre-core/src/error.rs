use thiserror::Error;

/// Errors raised by deterministic wallet transfers.
///
/// A failed transfer leaves balance and memory untouched.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WalletError {
    #[error("{op}: amount must be non-negative, got {amount}")]
    InvalidArgument { op: &'static str, amount: f64 },
}

/// Errors raised while loading or validating tuning profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid profile JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("density bounds inverted: min {min} >= max {max}")]
    InvertedDensityBounds { min: f64, max: f64 },
}
