// ABOUTME: Key/value configuration store abstraction and config entry format
// ABOUTME: Includes an in-memory store used by tests and local runs

use crate::error::ConfigLookupError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point lookups against the configuration store
pub trait ConfigProvider: Send + Sync {
    /// Return the value stored under `key`
    fn lookup(&self, key: &str) -> Result<String, ConfigLookupError>;
}

/// A single config entry as seeded at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Primary key
    #[serde(rename = "pk")]
    pub key: String,
    /// Opaque value, here a bucket name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Parse a stored entry body and extract its value
    pub fn parse_value(key: &str, body: &str) -> Result<String, ConfigLookupError> {
        let entry: ConfigEntry = serde_json::from_str(body).map_err(|e| ConfigLookupError::Malformed {
            key: key.to_string(),
            reason: format!("invalid entry document: {}", e),
        })?;

        entry.into_value()
    }

    /// Extract the value, rejecting missing or empty values
    pub fn into_value(self) -> Result<String, ConfigLookupError> {
        match self.value {
            Some(value) if !value.is_empty() => Ok(value),
            Some(_) => Err(ConfigLookupError::Malformed {
                key: self.key,
                reason: "value is empty".into(),
            }),
            None => Err(ConfigLookupError::Malformed {
                key: self.key,
                reason: "missing value field".into(),
            }),
        }
    }
}

/// In-memory config store that counts lookups
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    entries: HashMap<String, ConfigEntry>,
    unavailable: bool,
    lookups: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ConfigEntry) -> Self {
        self.entries.insert(entry.key.clone(), entry);
        self
    }

    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_entry(ConfigEntry::new(key, value))
    }

    /// Make every lookup fail as if the store were unreachable
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of lookups performed so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ConfigProvider for MemoryConfigStore {
    fn lookup(&self, key: &str) -> Result<String, ConfigLookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable {
            return Err(ConfigLookupError::Unavailable {
                store: "memory".into(),
                reason: "store marked unavailable".into(),
            });
        }

        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigLookupError::KeyNotFound(key.to_string()))?
            .into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        let body = r#"{"pk": "ErrorPageBucketName", "value": "bucket-A"}"#;
        assert_eq!(
            ConfigEntry::parse_value("ErrorPageBucketName", body).unwrap(),
            "bucket-A"
        );
    }

    #[test]
    fn test_parse_value_rejects_malformed_entries() {
        let missing = ConfigEntry::parse_value("ErrorPageBucketName", r#"{"pk": "ErrorPageBucketName"}"#);
        assert!(matches!(missing, Err(ConfigLookupError::Malformed { .. })));

        let not_json = ConfigEntry::parse_value("ErrorPageBucketName", "bucket-A");
        assert!(matches!(not_json, Err(ConfigLookupError::Malformed { .. })));

        let wrong_type = ConfigEntry::parse_value("ErrorPageBucketName", r#"{"pk": "ErrorPageBucketName", "value": 7}"#);
        assert!(matches!(wrong_type, Err(ConfigLookupError::Malformed { .. })));

        let empty = ConfigEntry::parse_value("ErrorPageBucketName", r#"{"pk": "ErrorPageBucketName", "value": ""}"#);
        assert!(matches!(empty, Err(ConfigLookupError::Malformed { .. })));
    }

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryConfigStore::new().with_value("ErrorPageBucketName", "bucket-A");

        assert_eq!(store.lookup("ErrorPageBucketName").unwrap(), "bucket-A");
        assert!(matches!(
            store.lookup("Other"),
            Err(ConfigLookupError::KeyNotFound(ref k)) if k == "Other"
        ));
        assert_eq!(store.lookups(), 2);
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemoryConfigStore::new()
            .with_value("ErrorPageBucketName", "bucket-A")
            .unavailable();

        assert!(matches!(
            store.lookup("ErrorPageBucketName"),
            Err(ConfigLookupError::Unavailable { .. })
        ));
    }
}
