// Flowferry Engine — credential store and settings.
//
// One JSON document under the data root holds the ordered account list plus
// the settings block. There is no partial-update primitive: editing one
// credential means load-all, mutate in memory, save-all.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::atoms::error::EngineResult;
use crate::atoms::types::AccountCredential;
use crate::engine::paths;

/// UI-level settings persisted alongside the accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub language: String,
    pub theme: String, // "light", "dark", "system"
    pub auto_update: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "zh-CN".to_string(),
            theme: "system".to_string(),
            auto_update: true,
        }
    }
}

/// The whole persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub accounts: Vec<AccountCredential>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            settings: Settings::default(),
        }
    }
}

/// Handle to the on-disk document. Cheap to construct; every operation is a
/// whole-document read or write.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the default location (`~/.flowferry/config.json`).
    pub fn open_default() -> Self {
        Self {
            path: paths::config_path(),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole document. A missing or unreadable file yields the
    /// default config rather than an error — first launch has no document.
    /// Legacy records carry no durable id; serde backfills one on decode,
    /// and the next `save` persists it.
    pub fn load(&self) -> Config {
        if self.path.exists() {
            match fs::read_to_string(&self.path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => warn!("[config] Malformed config, using defaults: {}", e),
                },
                Err(e) => warn!("[config] Cannot read config: {}", e),
            }
        }
        Config::default()
    }

    /// Replace the whole document.
    pub fn save(&self, config: &Config) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        info!("[config] Saved {} accounts", config.accounts.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_document_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        let config = store.load();
        assert!(config.accounts.is_empty());
        assert_eq!(config.settings.language, "zh-CN");
    }

    #[test]
    fn save_then_load_round_trips_accounts_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));

        let mut config = Config::default();
        config.accounts.push(AccountCredential::new("工作", "a@b.c", "pw"));
        let id = config.accounts[0].id;
        store.save(&config).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.accounts.len(), 1);
        assert_eq!(loaded.accounts[0].id, id);
        assert_eq!(loaded.accounts[0].name, "工作");
    }

    #[test]
    fn legacy_document_without_ids_gets_them_assigned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"accounts":[{"name":"账号1","username":"u","password":"p"}]}"#,
        )
        .unwrap();

        let store = CredentialStore::at(&path);
        let config = store.load();
        assert!(!config.accounts[0].id.is_nil());

        // After a save, the id is durable across reloads.
        store.save(&config).unwrap();
        let reloaded = store.load();
        assert_eq!(reloaded.accounts[0].id, config.accounts[0].id);
    }

    #[test]
    fn malformed_document_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{{{{").unwrap();
        let config = CredentialStore::at(&path).load();
        assert!(config.accounts.is_empty());
    }
}
