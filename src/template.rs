// ABOUTME: Error page template cache with memory and disk policies
// ABOUTME: Resolves the bucket on first use and fetches the template from the object store

use crate::cell::CachedValue;
use crate::error::TemplateFetchError;
use crate::object_store::ObjectStore;
use crate::resolver::ConfigResolver;
use crate::settings::CacheMode;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Suffix counter for temporary files written by concurrent disk fills
static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TemplateCache {
    mode: CacheMode,
    resolver: ConfigResolver,
    objects: Arc<dyn ObjectStore>,
    object_key: String,
    disk_path: PathBuf,
    content: CachedValue<String>,
}

impl TemplateCache {
    pub fn new(
        mode: CacheMode,
        resolver: ConfigResolver,
        objects: Arc<dyn ObjectStore>,
        object_key: impl Into<String>,
        disk_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode,
            resolver,
            objects,
            object_key: object_key.into(),
            disk_path: disk_path.into(),
            content: CachedValue::new(),
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// True once the template is held in memory
    pub fn is_cached(&self) -> bool {
        self.content.is_set()
    }

    /// Get the full template text
    pub fn get_template(&self) -> Result<String, TemplateFetchError> {
        match self.mode {
            CacheMode::Memory => self.load_from_memory(),
            CacheMode::Disk => self.load_from_disk(),
        }
    }

    fn load_from_memory(&self) -> Result<String, TemplateFetchError> {
        log::debug!("Loading template from memory");
        self.content.get_or_resolve(|| {
            log::info!("Loading template from object store (memory)");
            let bytes = self.fetch()?;
            Ok(String::from_utf8(bytes)?)
        })
    }

    fn load_from_disk(&self) -> Result<String, TemplateFetchError> {
        log::debug!("Loading template from disk");

        if !self.disk_path.exists() {
            log::info!("Loading template from object store (disk)");
            let bytes = self.fetch()?;
            write_atomically(&self.disk_path, &bytes)?;
        }

        let bytes = fs::read(&self.disk_path).map_err(|e| disk_error(&self.disk_path, e))?;
        Ok(String::from_utf8(bytes)?)
    }

    fn fetch(&self) -> Result<Vec<u8>, TemplateFetchError> {
        let bucket = self.resolver.resolve_bucket_identifier()?;
        self.objects.get_object(&bucket, &self.object_key)
    }
}

/// Write to a sibling file and rename so readers never see a partial template
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), TemplateFetchError> {
    let part = PART_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.{}.part", std::process::id(), part));

    fill_and_rename(path, &PathBuf::from(tmp), |tmp| fs::write(tmp, bytes))
}

/// The temporary file is removed whenever the fill or the rename fails
fn fill_and_rename<W>(path: &Path, tmp: &Path, write: W) -> Result<(), TemplateFetchError>
where
    W: FnOnce(&Path) -> io::Result<()>,
{
    if let Err(e) = write(tmp) {
        let _ = fs::remove_file(tmp);
        return Err(disk_error(tmp, e));
    }

    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        disk_error(path, e)
    })
}

fn disk_error(path: &Path, source: io::Error) -> TemplateFetchError {
    TemplateFetchError::Disk {
        path: path.to_path_buf(),
        source,
    }
}
