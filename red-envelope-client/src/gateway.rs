//! Contract gateway seam: everything the core needs from a wallet/RPC provider.

use core::fmt;

use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use red_envelope_types::{EnvelopeType, IRedEnvelope};
use serde::{Deserialize, Serialize};

use crate::{
    address_set::AddressSet,
    errors::{GatewayError, SubmissionError},
};

/// Identifier of a submitted transaction (its hash).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHandle(TxHash);

impl TransactionHandle {
    pub const fn new(hash: TxHash) -> Self {
        Self(hash)
    }

    pub const fn hash(&self) -> TxHash {
        self.0
    }
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A log entry as found in a receipt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Receipt of a mined transaction. Only the logs matter to the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub logs: Vec<RawLog>,
}

/// A contract call ready for submission or a read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSpec {
    pub contract_address: Address,
    pub function_name: &'static str,
    pub calldata: Bytes,
    pub value_wei: Option<U256>,
}

impl CallSpec {
    fn encode<C: SolCall>(contract_address: Address, call: &C, value_wei: Option<U256>) -> Self {
        Self {
            contract_address,
            function_name: C::SIGNATURE
                .split_once('(')
                .map_or(C::SIGNATURE, |(name, _)| name),
            calldata: call.abi_encode().into(),
            value_wei,
        }
    }

    /// `create(address[] receivers, uint8 envelopeType)`, paying `amount_wei`.
    ///
    /// Every entry of `receivers` is encoded; a single invalid entry fails the whole call.
    pub fn create(
        contract_address: Address,
        receivers: &AddressSet,
        envelope_type: EnvelopeType,
        amount_wei: U256,
    ) -> Result<Self, SubmissionError> {
        let receivers = receivers
            .to_addresses()
            .map_err(|entry| SubmissionError::InvalidAddress(entry.to_string()))?;
        let call = IRedEnvelope::createCall {
            receivers,
            envelopeType: envelope_type.as_u8(),
        };
        Ok(Self::encode(contract_address, &call, Some(amount_wei)))
    }

    /// `grab(uint256 id)`.
    pub fn grab(contract_address: Address, id: U256) -> Self {
        Self::encode(contract_address, &IRedEnvelope::grabCall { id }, None)
    }

    /// `getRecord(uint256 id)` (read-only).
    pub fn get_record(contract_address: Address, id: U256) -> Self {
        Self::encode(contract_address, &IRedEnvelope::getRecordCall { id }, None)
    }
}

/// Wallet/RPC provider as seen by the core.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Send a transaction. Fails synchronously on rejection or RPC errors.
    async fn submit(&self, call: &CallSpec) -> Result<TransactionHandle, GatewayError>;

    /// Resolve once the transaction behind `handle` is mined.
    async fn await_receipt(
        &self,
        handle: &TransactionHandle,
    ) -> Result<TransactionReceipt, GatewayError>;

    /// Side-effect-free contract call returning raw ABI-encoded output.
    async fn read_state(&self, call: &CallSpec) -> Result<Bytes, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: Address = Address::repeat_byte(0xce);

    #[test]
    fn create_carries_value_and_selector() {
        let set = AddressSet::parse("0x00000000000000000000000000000000000000a1");
        let amount = U256::from(42u64);
        let call = CallSpec::create(CONTRACT, &set, EnvelopeType::Random, amount).unwrap();

        assert_eq!(call.function_name, "create");
        assert_eq!(call.value_wei, Some(amount));
        assert_eq!(&call.calldata[..4], IRedEnvelope::createCall::SELECTOR.as_slice());

        let decoded = IRedEnvelope::createCall::abi_decode(&call.calldata, true).unwrap();
        assert_eq!(decoded.receivers, vec![Address::with_last_byte(0xa1)]);
        assert_eq!(decoded.envelopeType, 1);
    }

    #[test]
    fn create_rejects_unencodable_entries() {
        let set = AddressSet::parse("0x00000000000000000000000000000000000000a1\nnope");
        let err = CallSpec::create(CONTRACT, &set, EnvelopeType::Equal, U256::ZERO).unwrap_err();
        assert_eq!(err, SubmissionError::InvalidAddress("nope".into()));
        assert_eq!(err.to_string(), "Address \"nope\" is invalid.");
    }

    #[test]
    fn grab_and_get_record_are_valueless() {
        let grab = CallSpec::grab(CONTRACT, U256::from(7));
        assert_eq!(grab.function_name, "grab");
        assert_eq!(grab.value_wei, None);

        let read = CallSpec::get_record(CONTRACT, U256::from(7));
        assert_eq!(read.function_name, "getRecord");
        assert_eq!(&read.calldata[..4], IRedEnvelope::getRecordCall::SELECTOR.as_slice());
    }
}
