use alloy_primitives::U256;
use red_envelope_types::EnvelopeType;

use crate::{
    address_set::AddressSet,
    amount::{self, has_sufficient_balance, parse_ether},
    context::WalletContext,
    errors::{AmountError, ValidationError},
};

/// User input for a `create` call, already converted to wei and deduplicated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeRequest {
    pub amount_wei: U256,
    pub recipients: AddressSet,
    pub envelope_type: EnvelopeType,
}

impl EnvelopeRequest {
    pub fn new(amount_wei: U256, recipients: AddressSet, envelope_type: EnvelopeType) -> Self {
        Self {
            amount_wei,
            recipients,
            envelope_type,
        }
    }

    /// Build a request from the raw form fields: decimal ether and newline-separated recipients.
    pub fn from_input(
        amount: &str,
        recipients: &str,
        envelope_type: EnvelopeType,
    ) -> Result<Self, AmountError> {
        Ok(Self::new(
            parse_ether(amount)?,
            AddressSet::parse(recipients),
            envelope_type,
        ))
    }

    /// Gate the request on balance first, then on recipients.
    pub fn validate(&self, ctx: &WalletContext) -> Result<(), ValidationError> {
        if !has_sufficient_balance(self.amount_wei, ctx.balance.as_ref()) {
            return Err(ValidationError::InsufficientBalance {
                requested: self.amount_wei,
                available: amount::available(ctx.balance.as_ref()),
            });
        }
        if !self.recipients.has_valid_address() {
            return Err(ValidationError::NoValidRecipient);
        }
        Ok(())
    }
}
