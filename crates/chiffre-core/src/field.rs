use crate::config::FieldConfig;
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Handle to a field shared by many wallets.
pub type SharedField = Arc<Field>;

static GLOBAL_FIELD: Lazy<SharedField> = Lazy::new(|| Arc::new(Field::new()));

/// Point-in-time reading of a field, for external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub density: f64,
}

/// Collective scarcity/abundance field coupling every wallet's mutation.
///
/// Gains consume the field (density falls, future draws drift upward for
/// everyone); losses dissolve into it (density rises, draws drift
/// downward). Density always stays within the configured bounds.
///
/// Density is stored as the bit pattern of an `f64` so that concurrent
/// consume/dissolve calls apply as indivisible compare-and-swap steps.
#[derive(Debug)]
pub struct Field {
    density_bits: AtomicU64,
    config: FieldConfig,
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl Field {
    pub fn new() -> Self {
        Self::build(FieldConfig::default())
    }

    pub fn with_config(config: FieldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Fresh, isolated field behind a shareable handle.
    pub fn shared() -> SharedField {
        Arc::new(Self::new())
    }

    /// The process-wide field used by wallets that are not given one.
    pub fn global() -> SharedField {
        Arc::clone(&GLOBAL_FIELD)
    }

    fn build(config: FieldConfig) -> Self {
        Self {
            density_bits: AtomicU64::new(config.neutral_density.to_bits()),
            config,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn density(&self) -> f64 {
        f64::from_bits(self.density_bits.load(Ordering::Acquire))
    }

    /// Pull density towards the floor by a realized gain of `amount`.
    pub fn consume(&self, amount: f64) {
        self.shift(amount, -1.0);
    }

    /// Push density towards the ceiling by a realized loss of `amount`.
    pub fn dissolve(&self, amount: f64) {
        self.shift(amount, 1.0);
    }

    pub fn reset(&self) {
        self.density_bits
            .store(self.config.neutral_density.to_bits(), Ordering::Release);
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            density: self.density(),
        }
    }

    fn step(&self, amount: f64) -> f64 {
        let amount = if amount > 0.0 {
            amount.min(self.config.cap)
        } else {
            0.0
        };
        self.config.sensitivity * amount
    }

    fn shift(&self, amount: f64, sign: f64) {
        let step = self.step(amount);
        if step == 0.0 {
            return;
        }

        let FieldConfig {
            min_density,
            max_density,
            ..
        } = self.config;
        let apply = |density: f64| (density * (1.0 + sign * step)).clamp(min_density, max_density);

        let previous = self
            .density_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(apply(f64::from_bits(bits)).to_bits())
            })
            .unwrap_or_else(|bits| bits);

        let next = apply(f64::from_bits(previous));
        if next <= min_density || next >= max_density {
            debug!(step, density = next, "field density pinned at bound");
        }
    }
}
