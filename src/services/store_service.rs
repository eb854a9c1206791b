//! Storage seams for submitted records and uploaded files.
//!
//! The managed key-value and object stores are external collaborators; the
//! submitter only needs "put a record" and "put an object". This module holds
//! the traits and an in-memory backend; `file_service` has the on-disk one.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes `item` into `table` under `key`, replacing any previous item.
    async fn put_record(&self, table: &str, key: &str, item: Value) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Keeps everything in process memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(String, String), Value>>,
    objects: Mutex<HashMap<(String, String), StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, table: &str, key: &str) -> Option<Value> {
        self.lock_records()
            .get(&(table.to_string(), key.to_string()))
            .cloned()
    }

    pub fn record_count(&self, table: &str) -> usize {
        self.lock_records().keys().filter(|(t, _)| t == table).count()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock_objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock_objects()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Value>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), StoredObject>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put_record(&self, table: &str, key: &str, item: Value) -> Result<(), StoreError> {
        self.lock_records()
            .insert((table.to_string(), key.to_string()), item);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.lock_objects().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_are_replaced_by_key() {
        let store = MemoryStore::new();
        store.put_record("t", "1", json!({"v": 1})).await.unwrap();
        store.put_record("t", "1", json!({"v": 2})).await.unwrap();
        store.put_record("other", "1", json!({})).await.unwrap();

        assert_eq!(store.record("t", "1"), Some(json!({"v": 2})));
        assert_eq!(store.record_count("t"), 1);
    }

    #[tokio::test]
    async fn objects_are_scoped_by_bucket() {
        let store = MemoryStore::new();
        store.put_object("b", "p/1.txt", b"x".to_vec(), "text/plain").await.unwrap();

        assert_eq!(store.object_keys("b"), vec!["p/1.txt".to_string()]);
        assert!(store.object_keys("c").is_empty());
        assert_eq!(store.object("b", "p/1.txt").unwrap().content_type, "text/plain");
    }
}
