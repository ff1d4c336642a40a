use crate::application::ports::OfflineStore;
use crate::domain::entities::CacheEntry;
use crate::domain::value_objects::TableName;
use crate::shared::error::Result;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Read-side companion to the action queue: serves last-known-good records
/// while offline. Writes are last-write-wins; entries live until an explicit
/// remove or clear.
pub struct CacheStore {
    store: Arc<dyn OfflineStore>,
}

impl CacheStore {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    pub async fn put(&self, key: impl Into<String>, data: Value, target: TableName) -> Result<()> {
        let entry = CacheEntry::new(key.into(), data, target, Utc::now());
        self.store.put_cache_entry(&entry).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.store.get_cache_entry(key).await
    }

    pub async fn get_by_target(&self, target: &TableName) -> Result<Vec<CacheEntry>> {
        self.store.list_cache_entries_by_target(target).await
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        self.store.delete_cache_entry(key).await
    }

    /// Wipes the whole cache; used on logout or tenant switch.
    pub async fn clear(&self) -> Result<u64> {
        self.store.clear_cache().await
    }
}
