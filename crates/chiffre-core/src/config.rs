use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Bounds and sensitivity of the shared scarcity field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub min_density: f64,
    pub max_density: f64,
    /// Density change per unit of realized delta.
    pub sensitivity: f64,
    /// Normalization cap applied to a single consume/dissolve amount.
    pub cap: f64,
    pub neutral_density: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            min_density: 0.50,
            max_density: 2.00,
            sensitivity: 1e-6,
            cap: 1e12,
            neutral_density: 1.0,
        }
    }
}

impl FieldConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("min_density", self.min_density)?;
        positive("max_density", self.max_density)?;
        if self.min_density >= self.max_density {
            return Err(ConfigError::InvertedDensityBounds {
                min: self.min_density,
                max: self.max_density,
            });
        }
        non_negative("sensitivity", self.sensitivity)?;
        non_negative("cap", self.cap)?;
        if !(self.min_density..=self.max_density).contains(&self.neutral_density) {
            return Err(ConfigError::OutOfRange {
                field: "neutral_density",
                value: self.neutral_density,
            });
        }
        Ok(())
    }
}

/// Whether `Wallet::mutate` is gated on the wallet being at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestGate {
    /// Mutation runs in any state.
    #[default]
    Ungated,
    /// Mutation is a no-op returning 0.0 unless the wallet is at rest.
    RestOnly,
}

/// Ceiling shared by both memory biases.
pub const BIAS_CEILING: f64 = 3.0;
/// Floor keeping the log-normal draw non-degenerate.
pub const SIGMA_FLOOR: f64 = 1e-6;
pub const STABILITY_FLOOR: f64 = 1e-9;
/// Half-width of the cycle boost around 1.0.
pub const CYCLE_AMPLITUDE: f64 = 0.5;
pub const ETHICS_SIGMA_WEIGHT: f64 = 0.5;
pub const ETHICS_DRIFT: f64 = 0.01;
/// Bounds of `1 / density` before it enters the drift.
pub const ETHER_DRIFT_MIN: f64 = 0.90;
pub const ETHER_DRIFT_MAX: f64 = 1.10;
/// Magnitude cap and normalization scale for transfers.
pub const FLOW_CAP: f64 = 1e6;
pub const STABILITY_FLOW_RATE: f64 = 0.001;
pub const VOLATILITY_FLOW_RATE: f64 = 0.0005;
/// Incoming flows destabilize half as much as outgoing ones.
pub const INCOMING_FLOW_WEIGHT: f64 = 0.5;
pub const ETHICS_STABILITY_RATE: f64 = 0.5;

/// Tunables of the mutation draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    pub base_sigma: f64,
    pub rest_gate: RestGate,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            base_sigma: 0.02,
            rest_gate: RestGate::Ungated,
        }
    }
}

impl MutationConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("base_sigma", self.base_sigma)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}
