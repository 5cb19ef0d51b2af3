//! Envelope submission, transaction tracking and event decoding for the Red Envelope
//! contract.
//!
//! Flow: form input is gated by [`AddressSet`] and [`has_sufficient_balance`], submitted
//! through a [`ContractGateway`] by the [`TransactionTracker`], and the first log of the
//! mined receipt is decoded into a [`DecodedEvent`].

pub mod address_set;
pub mod amount;
pub mod config;
pub mod context;
pub mod decoder;
pub mod errors;
pub mod gateway;
pub mod reason;
pub mod records;
pub mod request;
pub mod tracker;


pub use address_set::{is_address, AddressSet};
pub use amount::{format_ether, has_sufficient_balance, parse_ether};
pub use config::{abbreviate, ContractConfig, ExplorerConfig};
pub use context::{WalletBalance, WalletContext};
pub use decoder::{decode_log, decode_receipt, DecodeOutcome, DecodedEvent};
pub use errors::{AmountError, GatewayError, SubmissionError, ValidationError};
pub use gateway::{CallSpec, ContractGateway, RawLog, TransactionHandle, TransactionReceipt};
pub use reason::extract_reason;
pub use records::{RecordQuery, ReadTicket};
pub use red_envelope_types::{EnvelopeType, Record};
pub use request::EnvelopeRequest;
pub use tracker::{Observation, Submission, SubmissionStatus, TrackerSnapshot, TransactionTracker};
