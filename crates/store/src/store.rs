use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::StoreError;

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Persisted key/value collections, one namespace per collection name.
///
/// `list` returns entries in insertion order. Overwriting a key with `set`
/// keeps its original position.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Insert or overwrite
    async fn set(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError>;

    /// Insert only; fails with `DuplicateId` if the key is taken
    async fn insert(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;

    /// Returns whether the key was present
    async fn remove(&self, collection: &str, key: &str) -> Result<bool, StoreError>;

    async fn clear(&self, collection: &str) -> Result<(), StoreError>;

    async fn contains(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(collection, key).await?.is_some())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    value: Value,
}

#[derive(Debug, Default)]
struct Collections {
    next_seq: u64,
    data: HashMap<String, HashMap<String, Entry>>,
}

impl Collections {
    fn put(&mut self, collection: &str, key: &str, value: Value) {
        let seq = self.next_seq;
        let entries = self.data.entry(collection.to_string()).or_default();
        match entries.get_mut(key) {
            Some(entry) => entry.value = value,
            None => {
                entries.insert(key.to_string(), Entry { seq, value });
                self.next_seq += 1;
            }
        }
    }
}

/// Non-persistent backend for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.inner
            .read()
            .await
            .data
            .get(collection)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .data
            .get(collection)
            .and_then(|entries| entries.get(key))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError> {
        self.inner.write().await.put(collection, key, value);
        Ok(())
    }

    async fn insert(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let taken = inner
            .data
            .get(collection)
            .is_some_and(|entries| entries.contains_key(key));
        if taken {
            return Err(StoreError::DuplicateId(key.to_string()));
        }
        inner.put(collection, key, value);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let inner = self.inner.read().await;
        let Some(entries) = inner.data.get(collection) else {
            return Ok(Vec::new());
        };

        let mut items: Vec<_> = entries.iter().collect();
        items.sort_by_key(|(_, entry)| entry.seq);
        Ok(items
            .into_iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .write()
            .await
            .data
            .get_mut(collection)
            .and_then(|entries| entries.remove(key))
            .is_some())
    }

    async fn clear(&self, collection: &str) -> Result<(), StoreError> {
        self.inner.write().await.data.remove(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = InMemoryStore::new();
        store.set("c", "a", json!(1)).await.unwrap();

        assert_eq!(store.get("c", "a").await.unwrap(), Some(json!(1)));
        assert_eq!(store.get("other", "a").await.unwrap(), None);
        assert!(store.contains("c", "a").await.unwrap());

        assert!(store.remove("c", "a").await.unwrap());
        assert!(!store.remove("c", "a").await.unwrap());
        assert_eq!(store.len("c").await, 0);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = InMemoryStore::new();
        store.insert("c", "a", json!("first")).await.unwrap();

        let err = store.insert("c", "a", json!("second")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "a"));
        assert_eq!(store.get("c", "a").await.unwrap(), Some(json!("first")));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = InMemoryStore::new();
        for key in ["x", "b", "m"] {
            store.set("c", key, json!(key)).await.unwrap();
        }
        store.set("c", "x", json!("updated")).await.unwrap();

        let keys: Vec<_> = store
            .list("c")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["x", "b", "m"]);
    }

    #[tokio::test]
    async fn test_clear_is_scoped_to_collection() {
        let store = InMemoryStore::new();
        store.set("a", "1", json!(1)).await.unwrap();
        store.set("b", "1", json!(1)).await.unwrap();

        store.clear("a").await.unwrap();
        assert!(store.list("a").await.unwrap().is_empty());
        assert_eq!(store.list("b").await.unwrap().len(), 1);
    }
}
