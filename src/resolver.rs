// ABOUTME: Discovers the template bucket through the configuration store
// ABOUTME: One successful lookup per instance, cached for its lifetime

use crate::cell::CachedValue;
use crate::config_store::ConfigProvider;
use crate::error::ConfigLookupError;
use std::sync::Arc;

pub struct ConfigResolver {
    provider: Arc<dyn ConfigProvider>,
    config_key: String,
    bucket: CachedValue<String>,
}

impl ConfigResolver {
    pub fn new(provider: Arc<dyn ConfigProvider>, config_key: impl Into<String>) -> Self {
        Self {
            provider,
            config_key: config_key.into(),
            bucket: CachedValue::new(),
        }
    }

    /// Bucket holding the error page template
    pub fn resolve_bucket_identifier(&self) -> Result<String, ConfigLookupError> {
        self.bucket.get_or_resolve(|| {
            log::info!("Resolving template bucket from config key {}", self.config_key);
            let bucket = self.provider.lookup(&self.config_key)?;
            log::debug!("Template bucket resolved to {}", bucket);
            Ok(bucket)
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.bucket.is_set()
    }
}
