//! Configuration resolution for dappshell.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/dappshell/settings.json)
//! 3. Project config (.dappshell/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Identifier the broker answers to when no other is configured.
pub const DEFAULT_BROKER_ID: &str = "shell";

/// Complete dappshell configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Dapps installed in the shell.
    #[serde(default)]
    pub dapps: Vec<DappManifest>,
}

/// Broker-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Identifier frames must address (`to`) and that replies carry (`from`).
    pub broker_id: String,
    /// JSON document holding persisted permissions and dapp visibility.
    pub store_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            broker_id: DEFAULT_BROKER_ID.to_string(),
            store_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Upstream JSON-RPC provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
        }
    }
}

/// A dapp known to the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappManifest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Initial visibility, before any persisted override.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

const fn default_visible() -> bool {
    true
}

/// One settings file. Absent fields leave the lower layers untouched.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    broker: BrokerLayer,
    #[serde(default)]
    provider: ProviderLayer,
    #[serde(default)]
    dapps: Vec<DappManifest>,
}

#[derive(Debug, Default, Deserialize)]
struct BrokerLayer {
    broker_id: Option<String>,
    store_path: Option<PathBuf>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderLayer {
    url: Option<String>,
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let project_path = project_dir.map(|dir| dir.join(".dappshell").join("settings.json"));
    let mut config = load_layers(global_config_path().as_deref(), project_path.as_deref())?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply the global then the project settings file over the defaults.
/// Missing files are skipped.
fn load_layers(global: Option<&Path>, project: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();
    for path in [global, project].into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        merge_config(&mut config, load_config_file(path)?);
        debug!(path = %path.display(), "Applied config layer");
    }
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("settings.json"))
}

/// Default location of the persisted store document.
pub fn default_store_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("store.json"))
}

/// `DAPPSHELL_CONFIG_DIR`, else the platform config directory.
fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("DAPPSHELL_CONFIG_DIR").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    platform_config_dir().map(|d| d.join("dappshell"))
}

#[cfg(target_os = "linux")]
fn platform_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
}

#[cfg(target_os = "macos")]
fn platform_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join("Library/Application Support"))
}

#[cfg(target_os = "windows")]
fn platform_config_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from)
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn platform_config_dir() -> Option<PathBuf> {
    None
}

fn load_config_file(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: ConfigLayer) {
    if let Some(broker_id) = overlay.broker.broker_id {
        base.broker.broker_id = broker_id;
    }
    if let Some(store_path) = overlay.broker.store_path {
        base.broker.store_path = Some(store_path);
    }
    if let Some(log_level) = overlay.broker.log_level {
        base.broker.log_level = log_level;
    }
    if let Some(url) = overlay.provider.url {
        base.provider.url = url;
    }

    // Later layers add dapps; an id seen again replaces the earlier manifest.
    for dapp in overlay.dapps {
        if let Some(existing) = base.dapps.iter_mut().find(|d| d.id == dapp.id) {
            *existing = dapp;
        } else {
            base.dapps.push(dapp);
        }
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("DAPPSHELL_BROKER_ID")
        && !val.is_empty()
    {
        config.broker.broker_id = val;
    }
    if let Ok(val) = std::env::var("DAPPSHELL_STORE_PATH") {
        config.broker.store_path = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("DAPPSHELL_LOG_LEVEL") {
        config.broker.log_level = val;
    }
    if let Ok(val) = std::env::var("DAPPSHELL_PROVIDER_URL") {
        config.provider.url = val;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn default_broker_id_is_shell() {
        let config = Config::default();
        assert_eq!(config.broker.broker_id, "shell");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"provider": {"url": "http://node:8545"}}"#).unwrap();

        let config = load_layers(Some(path.as_path()), None).unwrap();
        assert_eq!(config.provider.url, "http://node:8545");
        assert_eq!(config.broker.broker_id, "shell");
        assert_eq!(config.broker.log_level, "info");
    }

    #[test]
    fn dapp_visibility_defaults_to_true() {
        let config: Config =
            serde_json::from_str(r#"{"dapps": [{"id": "registry", "name": "Registry"}]}"#)
                .unwrap();
        assert!(config.dapps[0].visible);
        assert!(config.dapps[0].description.is_none());
    }

    #[test]
    fn merge_replaces_dapp_with_same_id() {
        let mut base = Config::default();
        base.dapps.push(DappManifest {
            id: "registry".into(),
            name: "Registry".into(),
            description: None,
            visible: true,
        });

        let mut overlay = ConfigLayer::default();
        overlay.dapps.push(DappManifest {
            id: "registry".into(),
            name: "Name Registry".into(),
            description: None,
            visible: false,
        });
        overlay.dapps.push(DappManifest {
            id: "tokens".into(),
            name: "Tokens".into(),
            description: None,
            visible: true,
        });

        merge_config(&mut base, overlay);
        assert_eq!(base.dapps.len(), 2);
        assert_eq!(base.dapps[0].name, "Name Registry");
        assert!(!base.dapps[0].visible);
    }

    #[test]
    fn project_layer_keeps_unset_global_values() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.json");
        let project = dir.path().join("project.json");
        std::fs::write(
            &global,
            r#"{"broker": {"broker_id": "wallet", "log_level": "debug"},
                "provider": {"url": "http://node:9000"}}"#,
        )
        .unwrap();
        std::fs::write(
            &project,
            r#"{"broker": {"log_level": "warn"},
                "dapps": [{"id": "registry", "name": "Registry"}]}"#,
        )
        .unwrap();

        let config = load_layers(Some(global.as_path()), Some(project.as_path())).unwrap();
        assert_eq!(config.provider.url, "http://node:9000");
        assert_eq!(config.broker.broker_id, "wallet");
        assert_eq!(config.broker.log_level, "warn");
        assert_eq!(config.dapps.len(), 1);
    }

    #[test]
    fn missing_layer_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_layers(Some(dir.path().join("absent.json").as_path()), None).unwrap();
        assert_eq!(config.provider.url, "http://127.0.0.1:8545");
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
