//! Persisted permission table.
//!
//! Keys are `"<method>:<appId>"`. A missing key means the user has not
//! decided yet, which callers treat like a denial.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::store::KeyValueStore;
use crate::tokens::TokenRegistry;

/// Store key the permission table is persisted under.
pub const PERMISSIONS_KEY: &str = "_dappshell::dapps::methods";

/// Table key for a method/app pair.
pub fn permission_key(method: &str, app_id: &str) -> String {
    format!("{method}:{app_id}")
}

/// Coerce a JSON value to an allow flag.
///
/// `false`, `null`, zero and the empty string are false; everything else,
/// including empty arrays and objects, is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Allow flags per (method, app), persisted in full on every change.
#[derive(Clone)]
pub struct PermissionStore {
    table: Arc<RwLock<BTreeMap<String, bool>>>,
    tokens: TokenRegistry,
    backend: Arc<dyn KeyValueStore>,
}

impl PermissionStore {
    /// Load the persisted table. An unreadable table starts empty.
    pub fn load(tokens: TokenRegistry, backend: Arc<dyn KeyValueStore>) -> Self {
        let table = match backend.load(PERMISSIONS_KEY) {
            Ok(Some(Value::Object(entries))) => entries
                .iter()
                .map(|(key, value)| (key.clone(), is_truthy(value)))
                .collect(),
            Ok(Some(other)) => {
                warn!(kind = ?other, "Ignoring persisted permissions that are not an object");
                BTreeMap::new()
            }
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(?e, "Failed to load persisted permissions");
                BTreeMap::new()
            }
        };
        debug!(entries = table.len(), "Loaded permission table");

        Self {
            table: Arc::new(RwLock::new(table)),
            tokens,
            backend,
        }
    }

    /// Whether the app behind `token` may call `method`.
    pub async fn is_allowed(&self, method: &str, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };
        match self.tokens.resolve(token).await {
            Some(app_id) => self.is_app_allowed(method, &app_id).await,
            None => false,
        }
    }

    pub async fn is_app_allowed(&self, method: &str, app_id: &str) -> bool {
        self.table
            .read()
            .await
            .get(&permission_key(method, app_id))
            .copied()
            .unwrap_or(false)
    }

    /// Allow `method` for the app behind `token`. Returns false when the
    /// token is unknown.
    pub async fn grant(&self, method: &str, token: Option<&str>) -> bool {
        let app_id = match token {
            Some(token) => self.tokens.resolve(token).await,
            None => None,
        };
        let Some(app_id) = app_id else {
            warn!(method, "Cannot grant permission for unknown token");
            return false;
        };

        let mut table = self.table.write().await;
        table.insert(permission_key(method, &app_id), true);
        self.persist(&table).await;
        drop(table);

        info!(method, app_id, "Permission granted");
        true
    }

    /// Merge a whole map of flags, coercing each value with [`is_truthy`].
    pub async fn set_bulk(&self, entries: &Map<String, Value>) -> bool {
        let mut table = self.table.write().await;
        for (key, value) in entries {
            table.insert(key.clone(), is_truthy(value));
        }
        self.persist(&table).await;
        drop(table);

        info!(entries = entries.len(), "Permissions updated");
        true
    }

    /// Copy of the full table.
    pub async fn snapshot(&self) -> BTreeMap<String, bool> {
        self.table.read().await.clone()
    }

    /// Write the full table. Failures leave the in-memory state in place.
    ///
    /// Callers hold the table's write lock across this, so writes land in
    /// mutation order.
    async fn persist(&self, table: &BTreeMap<String, bool>) {
        let value = Value::Object(
            table
                .iter()
                .map(|(key, allowed)| (key.clone(), Value::Bool(*allowed)))
                .collect(),
        );
        let backend = Arc::clone(&self.backend);
        match tokio::task::spawn_blocking(move || backend.store(PERMISSIONS_KEY, value)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(?e, "Failed to persist permissions"),
            Err(e) => warn!(?e, "Permission persist task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::store::{FailingStore, MemoryStore};

    async fn store_with_token(app_id: &str) -> (PermissionStore, Arc<MemoryStore>, String) {
        let tokens = TokenRegistry::new();
        let token = tokens.issue(app_id).await;
        let backend = Arc::new(MemoryStore::new());
        let store = PermissionStore::load(tokens, backend.clone());
        (store, backend, token)
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[tokio::test]
    async fn undecided_is_denied() {
        let (store, _, token) = store_with_token("dapp1").await;
        assert!(!store.is_allowed("eth_accounts", Some(&token)).await);
        assert!(!store.is_allowed("eth_accounts", None).await);
    }

    #[tokio::test]
    async fn grant_persists_full_table() {
        let (store, backend, token) = store_with_token("dapp1").await;

        assert!(store.grant("eth_accounts", Some(&token)).await);
        assert!(store.is_allowed("eth_accounts", Some(&token)).await);
        assert!(store.is_app_allowed("eth_accounts", "dapp1").await);

        let persisted = backend.load(PERMISSIONS_KEY).unwrap().unwrap();
        assert_eq!(persisted, json!({"eth_accounts:dapp1": true}));
    }

    #[tokio::test]
    async fn grant_with_unknown_token_is_noop() {
        let (store, backend, _) = store_with_token("dapp1").await;

        assert!(!store.grant("eth_accounts", Some("0xunknown")).await);
        assert!(store.snapshot().await.is_empty());
        assert!(backend.load(PERMISSIONS_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn set_bulk_coerces_and_merges() {
        let (store, _, token) = store_with_token("dapp1").await;
        store.grant("eth_coinbase", Some(&token)).await;

        let entries = json!({
            "eth_accounts:dapp1": 1,
            "eth_coinbase:dapp1": null,
            "parity_killAccount:dapp2": "yes",
        });
        assert!(store.set_bulk(entries.as_object().unwrap()).await);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.get("eth_accounts:dapp1"), Some(&true));
        assert_eq!(snapshot.get("eth_coinbase:dapp1"), Some(&false));
        assert_eq!(snapshot.get("parity_killAccount:dapp2"), Some(&true));
        assert!(!store.is_allowed("eth_coinbase", Some(&token)).await);
    }

    #[tokio::test]
    async fn explicit_false_survives_reload() {
        let tokens = TokenRegistry::new();
        let backend = Arc::new(MemoryStore::new());
        backend
            .store(PERMISSIONS_KEY, json!({"eth_accounts:dapp1": false, "eth_sign:dapp1": true}))
            .unwrap();

        let store = PermissionStore::load(tokens, backend);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.get("eth_accounts:dapp1"), Some(&false));
        assert!(store.is_app_allowed("eth_sign", "dapp1").await);
    }

    #[tokio::test]
    async fn failed_persist_still_updates_table() {
        let tokens = TokenRegistry::new();
        let token = tokens.issue("dapp1").await;
        let store = PermissionStore::load(tokens, Arc::new(FailingStore));

        assert!(store.grant("eth_accounts", Some(&token)).await);
        assert!(store.is_allowed("eth_accounts", Some(&token)).await);

        let entries = json!({"eth_coinbase:dapp1": true});
        assert!(store.set_bulk(entries.as_object().unwrap()).await);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.get("eth_accounts:dapp1"), Some(&true));
        assert_eq!(snapshot.get("eth_coinbase:dapp1"), Some(&true));
    }
}
