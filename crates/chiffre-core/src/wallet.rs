use crate::config::{
    MutationConfig, RestGate, CYCLE_AMPLITUDE, ETHER_DRIFT_MAX, ETHER_DRIFT_MIN, ETHICS_DRIFT,
    ETHICS_SIGMA_WEIGHT, SIGMA_FLOOR, STABILITY_FLOOR,
};
use crate::context::{CyclePhase, EthicsScore};
use crate::error::{ConfigError, WalletError};
use crate::field::{Field, SharedField};
use crate::memory::Memory;
use crate::source::{LogNormalParams, MutationSource};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, trace, warn};

/// Mode of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WalletState {
    /// Transactions are exact and deterministic.
    #[default]
    Circulation,
    /// Value mutates probabilistically.
    Rest,
}

/// Point-in-time reading of a wallet, for external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub balance: f64,
    pub state: WalletState,
    pub memory: Memory,
}

/// A living value container.
///
/// In circulation, transfers are exact. Mutations apply a log-normal
/// multiplicative factor shaped by the wallet's own memory, the caller's
/// ethics score and cycle phase, and the density of the shared field; the
/// realized delta feeds back into that field.
#[derive(Debug, Clone)]
pub struct Wallet {
    balance: f64,
    state: WalletState,
    memory: Memory,
    field: SharedField,
    config: MutationConfig,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Wallet {
    /// Wallet coupled to the process-wide field.
    pub fn new(initial: f64) -> Self {
        Self::with_field(initial, Field::global())
    }

    pub fn with_field(initial: f64, field: SharedField) -> Self {
        Self {
            balance: initial,
            state: WalletState::Circulation,
            memory: Memory::default(),
            field,
            config: MutationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MutationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn total(&self) -> f64 {
        self.balance
    }

    pub fn state(&self) -> WalletState {
        self.state
    }

    pub fn set_state(&mut self, state: WalletState) {
        self.state = state;
    }

    pub fn memory(&self) -> Memory {
        self.memory
    }

    pub fn field(&self) -> &SharedField {
        &self.field
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            balance: self.balance,
            state: self.state,
            memory: self.memory,
        }
    }

    pub fn spend(&mut self, amount: f64) -> Result<(), WalletError> {
        let amount = checked_amount("spend", amount)?;
        self.balance -= amount;
        self.memory.record_flow(amount, false);
        trace!(amount, balance = self.balance, "spend");
        Ok(())
    }

    pub fn receive(&mut self, amount: f64) -> Result<(), WalletError> {
        let amount = checked_amount("receive", amount)?;
        self.balance += amount;
        self.memory.record_flow(amount, true);
        trace!(amount, balance = self.balance, "receive");
        Ok(())
    }

    /// Log-normal parameters the next mutation would draw from.
    pub fn mutation_params(&self, ethics: EthicsScore, cycle: CyclePhase) -> LogNormalParams {
        let mut mu_log = 0.0;
        let mut sigma_log = self.config.base_sigma;

        sigma_log *= self.memory.volatility_bias;
        sigma_log /= self.memory.stability_bias.max(STABILITY_FLOOR);

        let cycle_boost = (1.0 + CYCLE_AMPLITUDE * (TAU * cycle.clamped()).sin())
            .clamp(1.0 - CYCLE_AMPLITUDE, 1.0 + CYCLE_AMPLITUDE);
        sigma_log *= cycle_boost;

        let es = ethics.clamped();
        sigma_log *= 1.0 - ETHICS_SIGMA_WEIGHT * es;
        mu_log += ETHICS_DRIFT * es;

        let ether = self.field.density();
        mu_log += (1.0 / ether).clamp(ETHER_DRIFT_MIN, ETHER_DRIFT_MAX).ln();

        LogNormalParams {
            mu_log,
            sigma_log: sigma_log.max(SIGMA_FLOOR),
        }
    }

    /// Apply one stochastic mutation and return the realized delta.
    ///
    /// NOTE: with the default `RestGate::Ungated` this runs whatever the
    /// wallet's state. Wallets are documented to mutate only at rest; set
    /// `rest_gate = RestOnly` to enforce that, in which case a circulating
    /// wallet returns 0.0 untouched.
    pub fn mutate<S>(&mut self, ethics: EthicsScore, cycle: CyclePhase, source: &mut S) -> f64
    where
        S: MutationSource + ?Sized,
    {
        if self.config.rest_gate == RestGate::RestOnly && self.state != WalletState::Rest {
            return 0.0;
        }

        let params = self.mutation_params(ethics, cycle);
        let mut factor = source.sample_log_normal(params);
        if !(factor.is_finite() && factor > 0.0) {
            warn!(factor, "mutation source returned an invalid factor, treating as 1.0");
            factor = 1.0;
        }

        let before = self.balance;
        self.balance *= factor;
        let delta = self.balance - before;

        if delta > 0.0 {
            self.field.consume(delta);
        } else {
            self.field.dissolve(-delta);
        }

        self.memory.record_mutation(factor, ethics.score);

        debug!(
            factor,
            delta,
            balance = self.balance,
            mu_log = params.mu_log,
            sigma_log = params.sigma_log,
            events = self.memory.events,
            "mutation applied"
        );
        delta
    }
}

// NaN fails the comparison and is rejected with the negatives.
fn checked_amount(op: &'static str, amount: f64) -> Result<f64, WalletError> {
    if amount >= 0.0 {
        Ok(amount)
    } else {
        Err(WalletError::InvalidArgument { op, amount })
    }
}
