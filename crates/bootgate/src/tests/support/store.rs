//! In-memory [`KeyValueStore`] that counts writes.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::bootstrap::{KeyValueStore, StoreError};

/// Key-value store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    /// Seeds `key` without counting it as a write.
    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.values
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_owned(), bytes.to_vec());
    }

    /// Current value under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Makes every later write fail with an I/O error.
    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }

    /// Number of successful writes issued through [`KeyValueStore::write`].
    pub fn write_count(&self) -> usize {
        self.writes.lock().expect("store mutex poisoned").len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_owned(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"),
            });
        }
        self.writes
            .lock()
            .expect("store mutex poisoned")
            .push(key.to_owned());
        self.insert(key, bytes);
        Ok(())
    }
}
