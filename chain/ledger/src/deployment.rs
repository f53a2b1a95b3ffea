//! Deployment records
//!
//! What the host reports after instantiating a ledger: where it lives, who
//! deployed it, and the state it started in. Records are written as pretty
//! JSON so deployment tooling can find the ledger again.

use chrono::{DateTime, Utc};
use ledger_types::ids::{Address, TxId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::DeploymentError;
use crate::ledger::LedgerInfo;

/// Contract name recorded for every deployment.
pub const CONTRACT_NAME: &str = "GuardedLedger";

/// File name used by `DeploymentRecord::save`.
pub const DEPLOYMENT_FILE_NAME: &str = "owner-only-deployment.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub contract_address: Address,
    pub transaction_hash: TxId,
    pub deployer: Address,
    pub deployment_time: DateTime<Utc>,
    pub network: String,
    pub initial_state: LedgerInfo,
}

impl DeploymentRecord {
    /// Write the record into `dir`, creating the directory if needed.
    /// Returns the path written.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DeploymentError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(DEPLOYMENT_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;

        info!(path = %path.display(), address = %self.contract_address, "Deployment record saved");
        Ok(path)
    }

    /// Read a record previously written by `save`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeploymentError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
