// ABOUTME: Handler configuration with compatible defaults
// ABOUTME: Values can be overridden from any key/value source such as a Fastly config store

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Path intercepted by the handler
pub const DEFAULT_ERROR_PATH: &str = "/errors/404.html";

/// Object key of the template inside the bucket
pub const DEFAULT_OBJECT_KEY: &str = "errors/404.html";

/// Local file used by disk mode
pub const DEFAULT_DISK_PATH: &str = "/tmp/404.html";

/// Config store key that names the template bucket
pub const DEFAULT_CONFIG_KEY: &str = "ErrorPageBucketName";

/// KV store (table) holding the config entries
pub const DEFAULT_CONFIG_TABLE: &str = "LambdaEdgeParameters";

pub const DEFAULT_CACHE_CONTROL: &str = "max-age=100";

pub const DEFAULT_REGION: &str = "us-east-1";

/// Token replaced with the request correlation id
pub const REQUEST_ID_TOKEN: &str = "__CF_REQUEST_ID__";

/// Correlation id used when the event carries none
pub const REQUEST_ID_NOT_FOUND: &str = "REQUEST_ID_NOT_FOUND";

/// Where the template is cached between invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Held in memory, zero I/O after the first fetch
    #[default]
    Memory,
    /// Persisted to a local file that is read on every request
    Disk,
}

/// What the handler does when the template cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Serve the built-in fallback page
    #[default]
    Fallback,
    /// Return the error to the caller
    Propagate,
}

impl FromStr for CacheMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheMode::Memory),
            "disk" => Ok(CacheMode::Disk),
            _ => Err(SettingsError::InvalidValue {
                option: "cache_mode",
                value: s.to_string(),
                expected: "memory, disk",
            }),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(FailurePolicy::Fallback),
            "propagate" => Ok(FailurePolicy::Propagate),
            _ => Err(SettingsError::InvalidValue {
                option: "failure_policy",
                value: s.to_string(),
                expected: "fallback, propagate",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_mode: CacheMode,
    pub failure_policy: FailurePolicy,
    pub object_key: String,
    pub disk_path: PathBuf,
    pub config_key: String,
    pub config_table: String,
    pub region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::default(),
            failure_policy: FailurePolicy::default(),
            object_key: DEFAULT_OBJECT_KEY.into(),
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            config_key: DEFAULT_CONFIG_KEY.into(),
            config_table: DEFAULT_CONFIG_TABLE.into(),
            region: DEFAULT_REGION.into(),
        }
    }
}

impl Settings {
    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = path.into();
        self
    }

    pub fn with_object_key(mut self, key: impl Into<String>) -> Self {
        self.object_key = key.into();
        self
    }

    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = key.into();
        self
    }

    /// Layer overrides from a key/value source on top of the current values.
    ///
    /// Recognised keys: `cache_mode`, `failure_policy`, `object_key`,
    /// `disk_path`, `config_key`, `config_table`, `aws_region`. The
    /// intercepted path and the `Cache-Control` value are fixed and have no
    /// override. Missing or empty keys keep the current value. Invalid enum values are collected and returned alongside the
    /// settings so the caller can log them; the previous value is kept.
    pub fn apply_overrides<F>(mut self, lookup: F) -> (Self, Vec<SettingsError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("cache_mode") {
            match value.parse() {
                Ok(mode) => self.cache_mode = mode,
                Err(e) => errors.push(e),
            }
        }
        if let Some(value) = get("failure_policy") {
            match value.parse() {
                Ok(policy) => self.failure_policy = policy,
                Err(e) => errors.push(e),
            }
        }
        if let Some(value) = get("object_key") {
            self.object_key = value;
        }
        if let Some(value) = get("disk_path") {
            self.disk_path = PathBuf::from(value);
        }
        if let Some(value) = get("config_key") {
            self.config_key = value;
        }
        if let Some(value) = get("config_table") {
            self.config_table = value;
        }
        if let Some(value) = get("aws_region") {
            self.region = value;
        }

        (self, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_deployed_values() {
        let settings = Settings::default();
        assert_eq!(settings.cache_mode, CacheMode::Memory);
        assert_eq!(settings.failure_policy, FailurePolicy::Fallback);
        assert_eq!(settings.object_key, "errors/404.html");
        assert_eq!(settings.disk_path, PathBuf::from("/tmp/404.html"));
        assert_eq!(settings.config_key, "ErrorPageBucketName");
        assert_eq!(settings.config_table, "LambdaEdgeParameters");
        assert_eq!(settings.region, "us-east-1");
    }

    #[test]
    fn test_apply_overrides() {
        let values: HashMap<&str, &str> = [
            ("cache_mode", "Disk"),
            ("failure_policy", "propagate"),
            ("disk_path", "/var/cache/404.html"),
            ("object_key", ""),
        ]
        .into_iter()
        .collect();

        let (settings, errors) =
            Settings::default().apply_overrides(|key| values.get(key).map(|v| v.to_string()));

        assert!(errors.is_empty());
        assert_eq!(settings.cache_mode, CacheMode::Disk);
        assert_eq!(settings.failure_policy, FailurePolicy::Propagate);
        assert_eq!(settings.disk_path, PathBuf::from("/var/cache/404.html"));
        // Empty values keep the default
        assert_eq!(settings.object_key, DEFAULT_OBJECT_KEY);
    }

    #[test]
    fn test_fixed_values_have_no_override() {
        let (settings, errors) = Settings::default().apply_overrides(|key| match key {
            "error_path" => Some("/oops".into()),
            "cache_control" => Some("no-store".into()),
            _ => None,
        });

        assert!(errors.is_empty());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_builders_set_template_location() {
        let settings = Settings::default()
            .with_object_key("pages/missing.html")
            .with_config_key("StagingErrorPageBucket");

        assert_eq!(settings.object_key, "pages/missing.html");
        assert_eq!(settings.config_key, "StagingErrorPageBucket");
        assert_eq!(settings.config_table, DEFAULT_CONFIG_TABLE);
    }

    #[test]
    fn test_invalid_override_keeps_previous_value() {
        let (settings, errors) = Settings::default().apply_overrides(|key| match key {
            "cache_mode" => Some("redis".into()),
            _ => None,
        });

        assert_eq!(settings.cache_mode, CacheMode::Memory);
        assert_eq!(
            errors,
            vec![SettingsError::InvalidValue {
                option: "cache_mode",
                value: "redis".into(),
                expected: "memory, disk",
            }]
        );
    }

    #[test]
    fn test_cache_mode_serde_names() {
        assert_eq!(serde_json::to_string(&CacheMode::Disk).unwrap(), "\"disk\"");
        let mode: CacheMode = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(mode, CacheMode::Memory);
    }
}
