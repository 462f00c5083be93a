use chiffre_core::{FieldSnapshot, WalletSnapshot};
use chiffre_metrics::mean_balance;
use chrono::Utc;
use serde::Serialize;

use crate::SimulationProfile;

#[derive(Debug, Clone, Serialize)]
pub struct WalletReport {
    pub index: usize,
    pub ethics: f64,
    #[serde(flatten)]
    pub snapshot: WalletSnapshot,
}

/// End-of-run summary, serialized as the binary's output.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub date: String,
    pub cycles: u64,
    pub profile: SimulationProfile,
    pub field: FieldSnapshot,
    pub mean_balance: f64,
    pub total_mutations: u64,
    pub wallets: Vec<WalletReport>,
}

impl SimulationReport {
    pub fn new(
        profile: SimulationProfile,
        cycles: u64,
        field: FieldSnapshot,
        wallets: Vec<WalletReport>,
    ) -> Self {
        let snapshots: Vec<WalletSnapshot> = wallets.iter().map(|w| w.snapshot).collect();
        let total_mutations = snapshots.iter().map(|s| s.memory.events).sum();

        Self {
            date: Utc::now().format("%Y-%m-%d").to_string(),
            cycles,
            profile,
            field,
            mean_balance: mean_balance(&snapshots),
            total_mutations,
            wallets,
        }
    }

    pub fn snapshots(&self) -> Vec<WalletSnapshot> {
        self.wallets.iter().map(|w| w.snapshot).collect()
    }
}
