//! In-memory storage adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::entities::StoredRequest;
use crate::ports::outbound::{StorageAdapter, StorageError};

/// In-memory request store for single-process deployments and tests.
///
/// The whole map sits behind one async mutex and `consume` re-checks the
/// entry under that lock, so the consumption transition is atomic within the
/// process. Retention is unbounded; evicting stale unconsumed requests is
/// the embedding service's job.
#[derive(Default)]
pub struct MemoryStorageAdapter {
    requests: Mutex<HashMap<String, StoredRequest>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests, consumed entries included.
    pub async fn len(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.requests.lock().await.is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorageAdapter {
    async fn get(&self, nonce: &str) -> Result<Option<StoredRequest>, StorageError> {
        Ok(self.requests.lock().await.get(nonce).cloned())
    }

    async fn set(&self, nonce: &str, request: StoredRequest) -> Result<(), StorageError> {
        self.requests.lock().await.insert(nonce.to_string(), request);
        Ok(())
    }

    async fn delete(&self, nonce: &str) -> Result<(), StorageError> {
        self.requests.lock().await.remove(nonce);
        Ok(())
    }

    // The consumed check and the write happen under one lock acquisition,
    // so racing consumers cannot both pass the gate.
    async fn consume(&self, nonce: &str, entry: StoredRequest) -> Result<bool, StorageError> {
        let mut requests = self.requests.lock().await;
        match requests.get(nonce) {
            Some(existing) if !existing.is_consumed() => {
                requests.insert(nonce.to_string(), entry);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn stored(request: &str) -> StoredRequest {
        StoredRequest::new(request.to_string(), 1_594_000_000, Map::new())
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStorageAdapter::new();

        store
            .set("42", stored("cashid:test/test?a=auth&x=42"))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        let entry = store.get("42").await.unwrap().unwrap();
        assert_eq!(entry.request, "cashid:test/test?a=auth&x=42");

        store.delete("42").await.unwrap();
        assert_eq!(store.get("42").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_unknown_nonce_is_none() {
        let store = MemoryStorageAdapter::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_replaces_existing_entry() {
        let store = MemoryStorageAdapter::new();
        store.set("1", stored("cashid:test/a?a=auth&x=1")).await.unwrap();
        store.set("1", stored("cashid:test/b?a=auth&x=1")).await.unwrap();

        let entry = store.get("1").await.unwrap().unwrap();
        assert_eq!(entry.request, "cashid:test/b?a=auth&x=1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_not_an_error() {
        let store = MemoryStorageAdapter::new();
        store.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_consume_is_exactly_once() {
        let store = MemoryStorageAdapter::new();
        store
            .set("7", stored("cashid:test/test?a=auth&x=7"))
            .await
            .unwrap();

        let mut consumed = stored("cashid:test/test?a=auth&x=7");
        consumed.consumed_at = Some(1_594_000_001);

        assert!(store.consume("7", consumed.clone()).await.unwrap());
        assert!(!store.consume("7", consumed).await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_refuses_missing_nonce() {
        let store = MemoryStorageAdapter::new();
        let entry = stored("cashid:test/test?a=auth&x=9");
        assert!(!store.consume("9", entry).await.unwrap());
    }
}
