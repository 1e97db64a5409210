//! Per-session token registry.
//!
//! Every dapp frame obtains a token with `shell_requestNewToken` and sends it
//! with each later call. Tokens live until the process exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sha3::{Digest, Keccak256};
use tokio::sync::RwLock;
use tracing::debug;

use dappshell_core::envelope::REQUEST_NEW_TOKEN;

/// Derive a token from an app id and an issuance timestamp.
pub fn derive_token(app_id: &str, timestamp_nanos: u128) -> String {
    let digest = Keccak256::digest(format!("{app_id}:{timestamp_nanos}").as_bytes());
    format!("0x{}", hex::encode(digest))
}

/// Mapping from issued token to the app id that requested it.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `app_id`.
    pub async fn issue(&self, app_id: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let token = derive_token(app_id, nanos);
        self.tokens
            .write()
            .await
            .insert(token.clone(), app_id.to_string());
        debug!(app_id, "Issued session token");
        token
    }

    /// App id the token was issued to.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.tokens.read().await.get(token).cloned()
    }

    /// Check that `token` authenticates `app_id` for a call to `method`.
    ///
    /// A missing token is only accepted for the bootstrap call.
    pub async fn is_valid(&self, method: Option<&str>, app_id: &str, token: Option<&str>) -> bool {
        match token {
            None | Some("") => method == Some(REQUEST_NEW_TOKEN),
            Some(token) => self.resolve(token).await.as_deref() == Some(app_id),
        }
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}
