use alloy_primitives::{TxHash, U256};
use thiserror::Error;

use crate::reason::extract_reason;

/// Local gating failures. These never reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("insufficient balance: requested {requested} wei, available {available} wei")]
    InsufficientBalance { requested: U256, available: U256 },
    #[error("no valid recipient address")]
    NoValidRecipient,
}

/// Errors reported by a [`ContractGateway`](crate::gateway::ContractGateway).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The wallet or node refused to send the transaction.
    #[error("{0}")]
    Rejected(String),
    /// Transport or JSON-RPC failure.
    #[error("{0}")]
    Rpc(String),
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("timed out waiting for receipt of {0}")]
    Timeout(TxHash),
    /// Return data of a read call could not be decoded.
    #[error("could not decode contract response: {0}")]
    Decode(String),
}

/// A submission attempt that failed after passing local validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// A recipient entry could not be ABI-encoded as an address.
    #[error("Address \"{0}\" is invalid.")]
    InvalidAddress(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SubmissionError {
    /// Human-readable reason shown to the user.
    pub fn reason(&self) -> String {
        extract_reason(&self.to_string())
    }
}

/// Errors while converting a decimal ether string to wei.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("invalid amount {input:?}: {message}")]
    Invalid { input: String, message: String },
}
