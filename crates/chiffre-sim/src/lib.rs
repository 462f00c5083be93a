pub mod economy;
pub mod profile;
pub mod report;

pub use economy::Economy;
pub use profile::SimulationProfile;
pub use report::{SimulationReport, WalletReport};

use chiffre_core::{ConfigError, WalletError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation profile JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("population must contain at least one wallet")]
    EmptyPopulation,
    #[error("at least one worker is required")]
    NoWorkers,
    #[error("{0} out of range: {1}")]
    OutOfRange(&'static str, f64),
    #[error("a mutation worker panicked")]
    WorkerPanicked,
}
