//! Installed dapps and their visibility.
//!
//! Visibility changes made through the shell are persisted as overrides on
//! top of the configured manifests.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};

use dappshell_core::config::DappManifest;

use crate::store::KeyValueStore;

/// Store key for persisted visibility overrides (`{appId: bool}`).
pub const VISIBILITY_KEY: &str = "_dappshell::dapps::visibility";

/// A dapp as reported to frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DappInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visible: bool,
}

/// Registry of installed dapps.
#[derive(Clone)]
pub struct DappRegistry {
    dapps: Arc<RwLock<Vec<DappInfo>>>,
    backend: Arc<dyn KeyValueStore>,
}

impl DappRegistry {
    /// Build the registry from manifests, applying persisted overrides.
    pub fn load(manifests: &[DappManifest], backend: Arc<dyn KeyValueStore>) -> Self {
        let overrides = match backend.load(VISIBILITY_KEY) {
            Ok(Some(Value::Object(map))) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                warn!(?e, "Failed to load dapp visibility");
                Map::new()
            }
        };

        let dapps = manifests
            .iter()
            .map(|m| DappInfo {
                id: m.id.clone(),
                name: m.name.clone(),
                description: m.description.clone(),
                visible: overrides
                    .get(&m.id)
                    .and_then(Value::as_bool)
                    .unwrap_or(m.visible),
            })
            .collect();

        Self {
            dapps: Arc::new(RwLock::new(dapps)),
            backend,
        }
    }

    pub async fn all_apps(&self) -> Vec<DappInfo> {
        self.dapps.read().await.clone()
    }

    pub async fn visible_apps(&self) -> Vec<DappInfo> {
        self.dapps
            .read()
            .await
            .iter()
            .filter(|d| d.visible)
            .cloned()
            .collect()
    }

    /// Show or hide a dapp. Returns false when the id is unknown.
    pub async fn set_visibility(&self, app_id: &str, visible: bool) -> bool {
        let mut dapps = self.dapps.write().await;
        let Some(dapp) = dapps.iter_mut().find(|d| d.id == app_id) else {
            return false;
        };
        dapp.visible = visible;

        let overrides: Map<String, Value> = dapps
            .iter()
            .map(|d| (d.id.clone(), Value::Bool(d.visible)))
            .collect();

        let backend = Arc::clone(&self.backend);
        let write = tokio::task::spawn_blocking(move || {
            backend.store(VISIBILITY_KEY, Value::Object(overrides))
        });
        match write.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(?e, "Failed to persist dapp visibility"),
            Err(e) => warn!(?e, "Visibility persist task failed"),
        }
        drop(dapps);
        info!(app_id, visible, "Dapp visibility changed");
        true
    }
}
