//! `dappshell` Core Library
//!
//! Shared functionality for `dappshell` components:
//! - Wire envelopes exchanged with embedded dapp frames
//! - Method sections deciding which calls need user approval
//! - Configuration resolution and hierarchy
//! - Common error types

pub mod config;
pub mod envelope;
pub mod error;
pub mod sections;
pub mod tracing_init;

pub use config::Config;
pub use envelope::{Call, Envelope, Reply, Unsubscribe};
pub use error::{Error, Result};
pub use sections::{MethodClassifier, MethodSection};
