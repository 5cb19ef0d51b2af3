//! Transaction lifecycle tracking.
//!
//! One submission is tracked at a time. Each submission takes a fresh ticket; a receipt is
//! applied only under the ticket that produced it, so a late receipt from a superseded
//! submission can never overwrite newer state.

use std::sync::Arc;

use alloy_primitives::U256;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    config::ContractConfig,
    context::WalletContext,
    decoder::{decode_receipt, DecodeOutcome, DecodedEvent},
    errors::{GatewayError, SubmissionError, ValidationError},
    gateway::{CallSpec, ContractGateway, TransactionHandle, TransactionReceipt},
    request::EnvelopeRequest,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Pending,
    Mined,
    Failed,
}

/// Immediate result of handing a call to the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Accepted(TransactionHandle),
    Rejected(SubmissionError),
}

/// Whether an incoming result was applied or belonged to a superseded request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    Applied,
    Stale,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Attempt {
    #[default]
    Idle,
    /// `handle` is `None` until the gateway accepts the call.
    Pending { handle: Option<TransactionHandle> },
    Mined {
        handle: TransactionHandle,
        outcome: DecodeOutcome,
    },
    Failed {
        handle: Option<TransactionHandle>,
        error: SubmissionError,
    },
}

#[derive(Debug, Default)]
struct Slot {
    ticket: u64,
    attempt: Attempt,
}

impl Slot {
    fn begin(&mut self) -> u64 {
        self.ticket += 1;
        self.attempt = Attempt::Pending { handle: None };
        self.ticket
    }

    fn resolve(
        &mut self,
        ticket: u64,
        result: Result<TransactionReceipt, GatewayError>,
    ) -> Observation {
        if ticket != self.ticket {
            return Observation::Stale;
        }
        let Attempt::Pending {
            handle: Some(handle),
        } = self.attempt
        else {
            return Observation::Stale;
        };

        self.attempt = match result {
            Ok(receipt) => {
                let outcome = decode_receipt(&receipt);
                tracing::info!(
                    tx = %handle,
                    logs = receipt.logs.len(),
                    matched = outcome.event().is_some(),
                    "transaction mined"
                );
                Attempt::Mined { handle, outcome }
            }
            Err(err) => {
                tracing::warn!(tx = %handle, error = %err, "transaction failed after submission");
                Attempt::Failed {
                    handle: Some(handle),
                    error: err.into(),
                }
            }
        };
        Observation::Applied
    }
}

/// Point-in-time view of the tracker for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub status: SubmissionStatus,
    pub handle: Option<TransactionHandle>,
    pub outcome: Option<DecodeOutcome>,
    pub error: Option<SubmissionError>,
}

impl TrackerSnapshot {
    fn of(attempt: &Attempt) -> Self {
        let (status, handle, outcome, error) = match attempt {
            Attempt::Idle => (SubmissionStatus::Idle, None, None, None),
            Attempt::Pending { handle } => (SubmissionStatus::Pending, *handle, None, None),
            Attempt::Mined { handle, outcome } => (
                SubmissionStatus::Mined,
                Some(*handle),
                Some(outcome.clone()),
                None,
            ),
            Attempt::Failed { handle, error } => {
                (SubmissionStatus::Failed, *handle, None, Some(error.clone()))
            }
        };
        Self {
            status,
            handle,
            outcome,
            error,
        }
    }

    /// The decoded event, if the transaction was mined and its first log matched.
    pub fn event(&self) -> Option<&DecodedEvent> {
        self.outcome.as_ref().and_then(DecodeOutcome::event)
    }

    /// Reason text for a failed attempt.
    pub fn reason(&self) -> Option<String> {
        self.error.as_ref().map(SubmissionError::reason)
    }
}

/// Drives `create`/`grab` submissions through a [`ContractGateway`].
pub struct TransactionTracker<G> {
    gateway: Arc<G>,
    contract: ContractConfig,
    slot: Arc<Mutex<Slot>>,
    watcher: Option<JoinHandle<()>>,
}

impl<G: ContractGateway + 'static> TransactionTracker<G> {
    pub fn new(gateway: Arc<G>, contract: ContractConfig) -> Self {
        Self {
            gateway,
            contract,
            slot: Arc::new(Mutex::new(Slot::default())),
            watcher: None,
        }
    }

    /// Submit `create` after gating on balance and recipients.
    ///
    /// A gating failure leaves the tracker untouched and never reaches the gateway.
    pub async fn create(
        &mut self,
        ctx: &WalletContext,
        request: &EnvelopeRequest,
    ) -> Result<Submission, ValidationError> {
        if let Err(err) = request.validate(ctx) {
            tracing::debug!(error = %err, "create blocked by local validation");
            return Err(err);
        }
        let call = CallSpec::create(
            self.contract.address,
            &request.recipients,
            request.envelope_type,
            request.amount_wei,
        );
        Ok(self.submit(call).await)
    }

    /// Submit `grab(id)`. Not gated.
    pub async fn grab(&mut self, id: U256) -> Submission {
        let call = CallSpec::grab(self.contract.address, id);
        self.submit(Ok(call)).await
    }

    async fn submit(&mut self, call: Result<CallSpec, SubmissionError>) -> Submission {
        self.stop_watcher();
        let ticket = self.slot.lock().await.begin();

        let result = match call {
            Ok(call) => {
                tracing::debug!(
                    function = call.function_name,
                    contract = %call.contract_address,
                    "submitting contract call"
                );
                self.gateway.submit(&call).await.map_err(SubmissionError::from)
            }
            Err(err) => Err(err),
        };

        let mut slot = self.slot.lock().await;
        match result {
            Ok(handle) => {
                tracing::info!(tx = %handle, "transaction submitted");
                slot.attempt = Attempt::Pending {
                    handle: Some(handle),
                };
                drop(slot);
                self.watch(ticket, handle);
                Submission::Accepted(handle)
            }
            Err(error) => {
                tracing::warn!(error = %error, "submission failed");
                slot.attempt = Attempt::Failed {
                    handle: None,
                    error: error.clone(),
                };
                Submission::Rejected(error)
            }
        }
    }

    fn watch(&mut self, ticket: u64, handle: TransactionHandle) {
        let gateway = Arc::clone(&self.gateway);
        let slot = Arc::clone(&self.slot);
        self.watcher = Some(tokio::spawn(async move {
            let result = gateway.await_receipt(&handle).await;
            if slot.lock().await.resolve(ticket, result) == Observation::Stale {
                tracing::debug!(tx = %handle, "discarding receipt of superseded submission");
            }
        }));
    }

    fn stop_watcher(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }

    /// Apply a receipt delivered from outside (push-style gateways).
    ///
    /// Receipts for anything but the current pending handle are discarded.
    pub async fn observe_receipt(
        &self,
        handle: &TransactionHandle,
        receipt: TransactionReceipt,
    ) -> Observation {
        let mut slot = self.slot.lock().await;
        let current = matches!(slot.attempt, Attempt::Pending { handle: Some(h) } if h == *handle);
        if !current {
            tracing::debug!(tx = %handle, "discarding receipt for a handle that is not tracked");
            return Observation::Stale;
        }
        let ticket = slot.ticket;
        slot.resolve(ticket, Ok(receipt))
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot::of(&self.slot.lock().await.attempt)
    }

    /// Wait for the current receipt watcher (if any) to finish, then snapshot.
    pub async fn settle(&mut self) -> TrackerSnapshot {
        if let Some(watcher) = self.watcher.take() {
            if let Err(err) = watcher.await {
                if err.is_panic() {
                    tracing::warn!(error = %err, "receipt watcher panicked");
                }
            }
        }
        self.snapshot().await
    }

    /// Forget the current submission and return to `Idle`.
    pub async fn reset(&mut self) {
        self.stop_watcher();
        let mut slot = self.slot.lock().await;
        slot.ticket += 1;
        slot.attempt = Attempt::Idle;
    }
}

impl<G> Drop for TransactionTracker<G> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn slot_ignores_results_from_older_tickets() {
        let mut slot = Slot::default();
        let first = slot.begin();
        let second = slot.begin();
        let handle = TransactionHandle::new(B256::with_last_byte(2));
        slot.attempt = Attempt::Pending {
            handle: Some(handle),
        };

        assert_eq!(
            slot.resolve(first, Ok(TransactionReceipt::default())),
            Observation::Stale
        );
        assert_eq!(slot.attempt, Attempt::Pending { handle: Some(handle) });

        assert_eq!(
            slot.resolve(second, Ok(TransactionReceipt::default())),
            Observation::Applied
        );
        assert_eq!(
            slot.attempt,
            Attempt::Mined {
                handle,
                outcome: DecodeOutcome::NoMatch
            }
        );
    }

    #[test]
    fn slot_needs_a_handle_before_resolving() {
        let mut slot = Slot::default();
        let ticket = slot.begin();
        assert_eq!(
            slot.resolve(ticket, Err(GatewayError::Rpc("boom".into()))),
            Observation::Stale
        );
        assert_eq!(TrackerSnapshot::of(&slot.attempt).status, SubmissionStatus::Pending);
    }
}
