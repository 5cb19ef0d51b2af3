//! Shared types for the Red Envelope contract: ABI bindings and envelope kinds.

pub mod abi;
pub mod envelope;

pub use abi::IRedEnvelope::{self, Create, Receive, Record};
pub use envelope::EnvelopeType;
