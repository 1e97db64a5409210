//! Permission model for dapp calls.
//!
//! Persisted allow flags per (method, app) pair, and the queue of calls
//! waiting for the user to decide on them.

mod queue;
mod store;
mod types;

pub use queue::RequestQueue;
pub use store::{PERMISSIONS_KEY, PermissionStore, is_truthy, permission_key};
pub use types::QueuedRequest;
