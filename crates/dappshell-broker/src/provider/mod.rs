//! RPC provider the broker forwards authorized calls to.

mod http;

pub use http::{HttpProvider, HttpProviderConfig};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Provider call errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Upstream JSON-RPC provider.
///
/// Subscription state lives entirely on the provider side; the broker only
/// passes subscription ids through.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Plain method call.
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError>;

    /// Start a subscription described by `api`. Resolves to the subscription id.
    async fn subscribe(&self, api: &Value, params: Vec<Value>) -> Result<Value, ProviderError>;

    async fn unsubscribe(&self, sub_id: &str) -> Result<Value, ProviderError>;

    async fn unsubscribe_all(&self) -> Result<Value, ProviderError>;
}
