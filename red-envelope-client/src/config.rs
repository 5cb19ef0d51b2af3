//! Deployment configuration injected by the caller.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::gateway::TransactionHandle;

pub const DEFAULT_EXPLORER_HOST: &str = "sepolia.etherscan.io";

/// Where the contract lives and how its transactions are linked for humans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub address: Address,
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

impl ContractConfig {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            explorer: ExplorerConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub host: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_EXPLORER_HOST.to_string(),
        }
    }
}

impl ExplorerConfig {
    /// `https://<host>/tx/<hash>`.
    pub fn tx_url(&self, handle: &TransactionHandle) -> String {
        format!("https://{}/tx/{}", self.host, handle)
    }
}

/// Shorten a hash or address for display: `0x1234...abcd`.
pub fn abbreviate(value: &str) -> String {
    if value.len() <= 10 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}
