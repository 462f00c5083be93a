use chiffre_core::{FieldConfig, MutationConfig};
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Shape of a simulated population. Every field may be omitted from a JSON
/// profile; missing ones take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationProfile {
    pub wallets: usize,
    pub initial_balance: f64,
    pub cycles: u64,
    /// Cycles per full phase turn.
    pub period: u64,
    pub workers: usize,
    pub seed: u64,
    /// Share of wallets that start at rest.
    pub rest_share: f64,
    /// Flip every wallet's state each `toggle_every` cycles; 0 never flips.
    pub toggle_every: u64,
    /// Share of balance a circulating wallet pays its neighbour per cycle.
    pub transfer_fraction: f64,
    /// Ethics scores are spread evenly over `[ethics_min, ethics_max]`.
    pub ethics_min: f64,
    pub ethics_max: f64,
    pub field: FieldConfig,
    pub mutation: MutationConfig,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            wallets: 16,
            initial_balance: 1_000.0,
            cycles: 120,
            period: 12,
            workers: 4,
            seed: 42,
            rest_share: 0.5,
            toggle_every: 6,
            transfer_fraction: 0.01,
            ethics_min: -1.0,
            ethics_max: 1.0,
            field: FieldConfig::default(),
            mutation: MutationConfig::default(),
        }
    }
}

impl SimulationProfile {
    pub fn from_json_str(raw: &str) -> Result<Self, SimError> {
        let profile: Self = serde_json::from_str(raw)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.wallets == 0 {
            return Err(SimError::EmptyPopulation);
        }
        if self.workers == 0 {
            return Err(SimError::NoWorkers);
        }
        if !self.initial_balance.is_finite() {
            return Err(SimError::OutOfRange("initial_balance", self.initial_balance));
        }
        if !(0.0..=1.0).contains(&self.rest_share) {
            return Err(SimError::OutOfRange("rest_share", self.rest_share));
        }
        if !(0.0..=1.0).contains(&self.transfer_fraction) {
            return Err(SimError::OutOfRange(
                "transfer_fraction",
                self.transfer_fraction,
            ));
        }
        if !(self.ethics_min.is_finite() && self.ethics_max.is_finite())
            || self.ethics_min > self.ethics_max
        {
            return Err(SimError::OutOfRange("ethics_min", self.ethics_min));
        }
        self.field.validate()?;
        self.mutation.validate()?;
        Ok(())
    }

    /// Ethics score of wallet `idx`.
    pub fn ethics_for(&self, idx: usize) -> f64 {
        if self.wallets <= 1 {
            return (self.ethics_min + self.ethics_max) / 2.0;
        }
        let t = idx as f64 / (self.wallets - 1) as f64;
        self.ethics_min + t * (self.ethics_max - self.ethics_min)
    }
}
