// ABOUTME: Object store abstraction for fetching template content
// ABOUTME: Includes an in-memory store used by tests and local runs

use crate::error::TemplateFetchError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fetch objects by bucket and key
pub trait ObjectStore: Send + Sync {
    /// Return the full object body
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, TemplateFetchError>;
}

/// In-memory object store that counts fetches
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: HashMap<(String, String), Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), body.into());
        self
    }

    /// Number of fetches performed so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, TemplateFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| TemplateFetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
