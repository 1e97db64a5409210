//! dappshell Broker Library
//!
//! Mediates between embedded dapp frames and a JSON-RPC provider:
//! - Session tokens binding frames to app ids
//! - Persisted per-app method permissions
//! - Queue of calls awaiting user approval
//! - Dispatcher executing authorized calls and routing replies
//! - NDJSON stdio host for running the broker as a process

pub mod broker;
pub mod dapps;
pub mod frame;
pub mod host;
pub mod permission;
pub mod provider;
pub mod store;
pub mod tokens;

pub use broker::{Broker, Dispatch};
pub use frame::Frame;
