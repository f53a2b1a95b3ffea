//! Configuration for ledger instantiation and the in-memory host.

use ledger_types::numeric::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Message every ledger starts with unless configured otherwise.
pub const DEFAULT_INITIAL_MESSAGE: &str = "Initial secret message";

/// Configuration applied when a ledger is instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Value of `message` at creation.
    pub initial_message: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_message: DEFAULT_INITIAL_MESSAGE.to_string(),
        }
    }
}

/// Configuration for the in-memory execution host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Network name written into deployment records.
    pub network: String,
    /// Deployers holding less than this are warned at deploy time.
    pub min_deployer_balance: Amount,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            network: "localhost".to_string(),
            // 0.01 native units
            min_deployer_balance: Amount::new(Decimal::new(1, 2)).unwrap_or(Amount::ZERO),
        }
    }
}
