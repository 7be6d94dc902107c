// ABOUTME: Fastly KV store and config store access for handler parameters
// ABOUTME: Backs the config provider and loads setting overrides

use crate::config_store::{ConfigEntry, ConfigProvider};
use crate::error::{ConfigLookupError, SettingsError};
use crate::settings::Settings;
use fastly::config_store::ConfigStore;
use fastly::kv_store::{KVStore, KVStoreError};

/// Config store holding setting overrides (must match fastly.toml)
pub const SETTINGS_STORE: &str = "error_page_config";

/// Config entries stored in a Fastly KV store, one JSON document per key
pub struct KvConfigStore {
    store_name: String,
}

impl KvConfigStore {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
        }
    }

    fn open(&self) -> Result<KVStore, ConfigLookupError> {
        KVStore::open(&self.store_name)
            .map_err(|e| self.unavailable(format!("Failed to open KV store: {}", e)))?
            .ok_or_else(|| self.unavailable("KV store not found".into()))
    }

    fn unavailable(&self, reason: String) -> ConfigLookupError {
        ConfigLookupError::Unavailable {
            store: self.store_name.clone(),
            reason,
        }
    }
}

impl ConfigProvider for KvConfigStore {
    fn lookup(&self, key: &str) -> Result<String, ConfigLookupError> {
        let store = self.open()?;

        match store.lookup(key) {
            Ok(mut lookup_result) => {
                let body = lookup_result.take_body().into_string();
                ConfigEntry::parse_value(key, &body)
            }
            Err(KVStoreError::ItemNotFound) => Err(ConfigLookupError::KeyNotFound(key.to_string())),
            Err(e) => Err(self.unavailable(format!("Failed to lookup {}: {}", key, e))),
        }
    }
}

/// Defaults overlaid with values from the settings config store.
///
/// A missing store leaves the defaults in place.
pub fn load_settings() -> (Settings, Vec<SettingsError>) {
    match ConfigStore::try_open(SETTINGS_STORE) {
        Ok(store) => Settings::default().apply_overrides(|key| store.try_get(key).ok().flatten()),
        Err(e) => {
            log::warn!("Config store {} unavailable, using defaults: {}", SETTINGS_STORE, e);
            (Settings::default(), Vec::new())
        }
    }
}
