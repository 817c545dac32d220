use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::{RecordStore, StoreError, INTEGRATED_COLLECTION};

/// Persisted set of entity ids whose integration completed at least once
#[derive(Clone)]
pub struct IdempotencySet {
    store: Arc<dyn RecordStore>,
    collection: String,
}

impl IdempotencySet {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_collection(store, INTEGRATED_COLLECTION)
    }

    pub fn with_collection(store: Arc<dyn RecordStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn contains(&self, id: &str) -> Result<bool, StoreError> {
        self.store.contains(&self.collection, id).await
    }

    /// Add a member. Returns false if it was already present.
    pub async fn insert(&self, id: &str) -> Result<bool, StoreError> {
        match self
            .store
            .insert(&self.collection, id, json!({ "added_at": Utc::now() }))
            .await
        {
            Ok(()) => Ok(true),
            Err(StoreError::DuplicateId(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        self.store.remove(&self.collection, id).await
    }

    pub async fn members(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .list(&self.collection)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(&self.collection).await
    }
}
