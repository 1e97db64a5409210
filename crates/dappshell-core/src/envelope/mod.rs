//! Wire envelopes exchanged with embedded dapp frames.
//!
//! Inbound messages are parsed once at intake into an [`Envelope`] whose
//! [`Call`] discriminant drives the rest of the pipeline. Anything that is
//! not addressed to the broker, or cannot be resolved to a call, is reported
//! as a [`DropReason`] and never answered.

mod parser;
mod types;

pub use parser::parse_envelope;
pub use types::*;
