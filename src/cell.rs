// ABOUTME: Compute-once cache cell shared by concurrent invocations
// ABOUTME: Values are resolved outside the lock and never invalidated once stored

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A value resolved on first use and kept for the life of the instance.
///
/// Concurrent first calls may each run their resolver; the first value stored
/// wins and every caller receives it. A failed resolve stores nothing, so the
/// next call tries again.
#[derive(Debug)]
pub struct CachedValue<T> {
    slot: RwLock<Option<T>>,
}

impl<T: Clone> CachedValue<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Current value, if resolved
    pub fn get(&self) -> Option<T> {
        self.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.read().is_some()
    }

    /// Return the cached value, or run `resolve` and cache its result
    pub fn get_or_resolve<E, F>(&self, resolve: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        // No lock is held while resolving; fetches can be slow
        let value = resolve()?;

        let mut slot = self.write();
        Ok(slot.get_or_insert(value).clone())
    }

    // Slot contents are always a complete value, so a poisoned lock is safe to reuse
    fn read(&self) -> RwLockReadGuard<'_, Option<T>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<T>> {
        self.slot.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone> Default for CachedValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_resolves_once() {
        let cell = CachedValue::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            let value: Result<String, ()> = cell.get_or_resolve(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("bucket-A".to_string())
            });
            assert_eq!(value, Ok("bucket-A".to_string()));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cell.is_set());
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cell: CachedValue<String> = CachedValue::new();

        let first: Result<String, &str> = cell.get_or_resolve(|| Err("unreachable"));
        assert_eq!(first, Err("unreachable"));
        assert!(!cell.is_set());

        let second: Result<String, &str> = cell.get_or_resolve(|| Ok("bucket-A".into()));
        assert_eq!(second, Ok("bucket-A".to_string()));
        assert_eq!(cell.get(), Some("bucket-A".to_string()));
    }

    #[test]
    fn test_first_stored_value_wins() {
        let cell = CachedValue::new();
        let _: Result<u32, ()> = cell.get_or_resolve(|| Ok(1));
        // Cache hit, resolver never runs
        let second: Result<u32, ()> = cell.get_or_resolve(|| Ok(2));
        assert_eq!(second, Ok(1));
    }

    #[test]
    fn test_concurrent_first_calls_agree() {
        let cell = Arc::new(CachedValue::<String>::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    let value: Result<String, ()> = cell.get_or_resolve(|| Ok("bucket-A".into()));
                    value
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok("bucket-A".to_string()));
        }
        assert_eq!(cell.get(), Some("bucket-A".to_string()));
    }
}
