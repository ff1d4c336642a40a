use crate::domain::value_objects::TableName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Last-known-good record for a key, served while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub target: TableName,
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: String, data: Value, target: TableName, last_updated: DateTime<Utc>) -> Self {
        Self {
            key,
            data,
            target,
            last_updated,
        }
    }
}
