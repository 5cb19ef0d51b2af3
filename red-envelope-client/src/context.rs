//! Wallet and chain state passed explicitly into gated operations.

use alloy_primitives::{Address, U256};

/// Balance snapshot from the wallet provider. May be stale between reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalletBalance {
    pub owner: Address,
    pub value_wei: U256,
}

/// The connected wallet as seen by the core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletContext {
    pub address: Option<Address>,
    pub chain_id: u64,
    pub balance: Option<WalletBalance>,
}

impl WalletContext {
    pub fn new(address: Address, chain_id: u64, value_wei: U256) -> Self {
        Self {
            address: Some(address),
            chain_id,
            balance: Some(WalletBalance {
                owner: address,
                value_wei,
            }),
        }
    }
}
