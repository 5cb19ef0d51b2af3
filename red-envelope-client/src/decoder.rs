//! Receipt log decoding against the contract's event schema.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use red_envelope_types::{Create, Receive};

use crate::gateway::{RawLog, TransactionReceipt};

/// An event emitted by the contract that the core knows how to present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedEvent {
    Create {
        id: U256,
        sender: Address,
        receivers: Vec<Address>,
        amount: U256,
    },
    /// The contract's `Receive` event; only the grabbed amount is consumed.
    Grab { amount: U256 },
}

/// Result of matching a log against the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    Matched(DecodedEvent),
    NoMatch,
}

impl DecodeOutcome {
    pub fn event(&self) -> Option<&DecodedEvent> {
        match self {
            DecodeOutcome::Matched(event) => Some(event),
            DecodeOutcome::NoMatch => None,
        }
    }
}

/// Decode the first log of a receipt. Later logs are ignored.
pub fn decode_receipt(receipt: &TransactionReceipt) -> DecodeOutcome {
    receipt
        .logs
        .first()
        .map_or(DecodeOutcome::NoMatch, decode_log)
}

/// Match a single log against every known event signature.
pub fn decode_log(log: &RawLog) -> DecodeOutcome {
    let Some(signature) = log.topics.first() else {
        return DecodeOutcome::NoMatch;
    };

    let decoded = if *signature == Create::SIGNATURE_HASH {
        decode_as::<Create>(log).map(|e| DecodedEvent::Create {
            id: e.id,
            sender: e.sender,
            receivers: e.receivers,
            amount: e.amount,
        })
    } else if *signature == Receive::SIGNATURE_HASH {
        decode_as::<Receive>(log).map(|e| DecodedEvent::Grab { amount: e.amount })
    } else {
        None
    };

    decoded.map_or(DecodeOutcome::NoMatch, DecodeOutcome::Matched)
}

fn decode_as<E: SolEvent>(log: &RawLog) -> Option<E> {
    E::decode_raw_log(log.topics.iter().copied(), &log.data, true)
        .inspect_err(|err| {
            tracing::debug!(event = E::SIGNATURE, error = %err, "log matched signature but failed to decode")
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, B256};

    fn log_of<E: SolEvent>(event: &E) -> RawLog {
        let data = event.encode_log_data();
        RawLog {
            topics: data.topics().to_vec(),
            data: data.data,
        }
    }

    fn create_event() -> Create {
        Create {
            id: U256::from(3),
            sender: Address::repeat_byte(0x11),
            receivers: vec![Address::repeat_byte(0x22), Address::repeat_byte(0x33)],
            amount: U256::from(10u64).pow(U256::from(18)),
        }
    }

    #[test]
    fn decodes_create() {
        let event = create_event();
        let outcome = decode_log(&log_of(&event));
        assert_eq!(
            outcome,
            DecodeOutcome::Matched(DecodedEvent::Create {
                id: event.id,
                sender: event.sender,
                receivers: event.receivers,
                amount: event.amount,
            })
        );
    }

    #[test]
    fn decodes_receive_as_grab() {
        let event = Receive {
            id: U256::from(3),
            receiver: Address::repeat_byte(0x22),
            amount: U256::from(5u64),
        };
        assert_eq!(
            decode_log(&log_of(&event)),
            DecodeOutcome::Matched(DecodedEvent::Grab { amount: U256::from(5u64) })
        );
    }

    #[test]
    fn unknown_or_malformed_logs_do_not_match() {
        assert_eq!(decode_log(&RawLog::default()), DecodeOutcome::NoMatch);

        let foreign = RawLog {
            topics: vec![B256::repeat_byte(0x42)],
            data: Bytes::new(),
        };
        assert_eq!(decode_log(&foreign), DecodeOutcome::NoMatch);

        let mut truncated = log_of(&create_event());
        truncated.data = Bytes::from(vec![0u8; 7]);
        assert_eq!(decode_log(&truncated), DecodeOutcome::NoMatch);

        let mut missing_topic = log_of(&create_event());
        missing_topic.topics.pop();
        assert_eq!(decode_log(&missing_topic), DecodeOutcome::NoMatch);
    }

    #[test]
    fn only_first_log_is_inspected() {
        let grab = Receive {
            id: U256::from(1),
            receiver: Address::ZERO,
            amount: U256::from(9u64),
        };
        let receipt = TransactionReceipt {
            logs: vec![
                RawLog {
                    topics: vec![B256::repeat_byte(0x42)],
                    data: Bytes::new(),
                },
                log_of(&grab),
            ],
        };
        assert_eq!(decode_receipt(&receipt), DecodeOutcome::NoMatch);
        assert_eq!(decode_receipt(&TransactionReceipt::default()), DecodeOutcome::NoMatch);
    }
}
