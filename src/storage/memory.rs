use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::{Storage, StorageError};

#[derive(Debug, Default)]
struct MemoryInner {
    items: HashMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: bool,
    fail_writes: bool,
}

/// In-memory storage keyed by string. Clones share the same map, so a test can
/// keep a handle and inspect or corrupt what the adapter wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would push the total stored bytes past `bytes`.
    pub fn with_quota(self, bytes: usize) -> Self {
        self.inner.borrow_mut().quota_bytes = Some(bytes);
        self
    }

    /// Simulates disabled storage (every call fails).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.borrow_mut().unavailable = unavailable;
    }

    /// Simulates a backend that reads fine but rejects writes.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Writes a raw value, bypassing quota and failure simulation.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .items
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(inner: &MemoryInner) -> Result<(), StorageError> {
        if inner.unavailable {
            return Err(StorageError::Unavailable("storage disabled".into()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.borrow();
        Self::check_available(&inner)?;
        Ok(inner.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        Self::check_available(&inner)?;
        if inner.fail_writes {
            return Err(StorageError::Backend(format!("write to '{key}' rejected")));
        }

        if let Some(limit) = inner.quota_bytes {
            let others: usize = inner
                .items
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let bytes = key.len() + value.len();
            if others + bytes > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes,
                    limit,
                });
            }
        }

        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        Self::check_available(&inner)?;
        inner.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip_and_remove() {
        let storage = MemoryStorage::new();
        let handle: &dyn Storage = &storage;

        handle.set_item("k", "{\"v\":1}").expect("set");
        assert_eq!(handle.get_item("k").expect("get"), Some("{\"v\":1}".into()));
        handle.remove_item("k").expect("remove");
        assert_eq!(handle.get_item("k").expect("get"), None);
    }

    #[test]
    fn clones_share_contents() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set_item("shared", "1").expect("set");
        assert_eq!(other.raw("shared").as_deref(), Some("1"));
    }

    #[test]
    fn quota_rejects_oversized_writes_and_keeps_old_value() {
        let storage = MemoryStorage::new().with_quota(16);
        storage.set_item("a", "short").expect("fits");
        let err = storage
            .set_item("a", "a value that is far too long")
            .expect_err("over quota");
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(storage.raw("a").as_deref(), Some("short"));
    }

    #[test]
    fn unavailable_storage_fails_every_call() {
        let storage = MemoryStorage::new();
        storage.set_unavailable(true);
        assert!(storage.get_item("k").is_err());
        assert!(storage.set_item("k", "v").is_err());
        assert!(storage.remove_item("k").is_err());
    }
}
