//! Keyed `getRecord(id)` reads.
//!
//! The query is re-keyed whenever the selected envelope id changes. A read result is only
//! stored if it belongs to the id that is still selected.

use std::sync::Arc;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use red_envelope_types::{IRedEnvelope, Record};

use crate::{
    config::ContractConfig,
    errors::GatewayError,
    gateway::{CallSpec, ContractGateway},
    tracker::Observation,
};

/// Identity of one read request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTicket {
    seq: u64,
    id: U256,
}

impl ReadTicket {
    pub fn id(&self) -> U256 {
        self.id
    }
}

pub struct RecordQuery<G> {
    gateway: Arc<G>,
    contract: ContractConfig,
    seq: u64,
    selected: Option<ReadTicket>,
    records: Option<Vec<Record>>,
}

impl<G: ContractGateway> RecordQuery<G> {
    pub fn new(gateway: Arc<G>, contract: ContractConfig) -> Self {
        Self {
            gateway,
            contract,
            seq: 0,
            selected: None,
            records: None,
        }
    }

    /// Select an envelope id. Returns a ticket when a new read is needed.
    ///
    /// Id `0` clears the selection; re-selecting the current id issues no read.
    pub fn select(&mut self, id: U256) -> Option<ReadTicket> {
        if self.selected.map(|t| t.id) == Some(id) {
            return None;
        }
        self.seq += 1;
        self.records = None;
        if id.is_zero() {
            self.selected = None;
            return None;
        }
        let ticket = ReadTicket { seq: self.seq, id };
        self.selected = Some(ticket);
        Some(ticket)
    }

    /// Run the read for `ticket`. Does not touch the query state.
    pub async fn fetch(&self, ticket: &ReadTicket) -> Result<Vec<Record>, GatewayError> {
        let call = CallSpec::get_record(self.contract.address, ticket.id);
        let raw = self.gateway.read_state(&call).await?;
        decode_records(&raw)
    }

    /// Store a read result if `ticket` is still the selected one.
    ///
    /// A failed read drops the selection so the next `select` of the same id reads again.
    pub fn apply(
        &mut self,
        ticket: ReadTicket,
        result: Result<Vec<Record>, GatewayError>,
    ) -> Result<Observation, GatewayError> {
        if self.selected != Some(ticket) {
            tracing::debug!(id = %ticket.id, "discarding records of a deselected envelope");
            return Ok(Observation::Stale);
        }
        match result {
            Ok(records) => {
                self.records = Some(records);
                Ok(Observation::Applied)
            }
            Err(err) => {
                self.selected = None;
                Err(err)
            }
        }
    }

    /// Select `id` and load its records if they are not loaded yet.
    pub async fn load(&mut self, id: U256) -> Result<&[Record], GatewayError> {
        if let Some(ticket) = self.select(id) {
            let result = self.fetch(&ticket).await;
            self.apply(ticket, result)?;
        }
        Ok(self.records())
    }

    /// Records of the selected envelope; empty until loaded.
    pub fn records(&self) -> &[Record] {
        self.records.as_deref().unwrap_or_default()
    }

    pub fn selected_id(&self) -> Option<U256> {
        self.selected.map(|t| t.id)
    }
}

/// ABI-decode the return data of `getRecord`.
pub fn decode_records(raw: &Bytes) -> Result<Vec<Record>, GatewayError> {
    IRedEnvelope::getRecordCall::abi_decode_returns(raw, true)
        .map(|ret| ret._0)
        .map_err(|err| GatewayError::Decode(err.to_string()))
}
