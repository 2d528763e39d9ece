use super::KeyValueBackend;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// In-memory backend. Nothing survives the process; used in tests and when
/// no data directory can be opened.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn insert_all(&self, entries: Vec<(&str, Vec<u8>)>) -> Result<()> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            debug!("Store PUT for key: {key}");
            map.insert(key.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_get_insert() {
        let backend = MemoryBackend::new();

        // Initially, store is empty
        assert!(backend.get("key1").unwrap().is_none());

        backend
            .insert_all(vec![("key1", b"one".to_vec()), ("key2", b"two".to_vec())])
            .unwrap();
        assert_eq!(backend.get("key1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(backend.get("key2").unwrap(), Some(b"two".to_vec()));

        // Last write wins
        backend.insert_all(vec![("key1", b"uno".to_vec())]).unwrap();
        assert_eq!(backend.get("key1").unwrap(), Some(b"uno".to_vec()));
    }
}
