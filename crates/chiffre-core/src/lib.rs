pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod memory;
pub mod source;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use config::{FieldConfig, MutationConfig, RestGate};
pub use context::{CyclePhase, EthicsScore};
pub use error::{ConfigError, WalletError};
pub use field::{Field, FieldSnapshot, SharedField};
pub use memory::Memory;
pub use source::{LogNormalParams, MutationSource, RngSource};
pub use wallet::{Wallet, WalletSnapshot, WalletState};
