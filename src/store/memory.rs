//! In-memory blob store
//!
//! Reference [`BlobStore`] implementation backed by a shared map. Used by
//! tests and by embedders that want gating semantics without an external
//! object store. Honors write preconditions, so conflict handling is
//! exercisable in-process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{BlobStore, Precondition, Version};

#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

struct StoredObject {
    body: Vec<u8>,
    revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, Version)>> {
        let objects = self.objects.read().await;
        let result = objects
            .get(key)
            .map(|obj| (obj.body.clone(), Version::new(obj.revision.to_string())));
        debug!(key, hit = result.is_some(), "Store get");
        Ok(result)
    }

    async fn put(&self, key: &str, body: Vec<u8>, precondition: Precondition) -> Result<Version> {
        let mut objects = self.objects.write().await;
        let current = objects.get(key);

        match &precondition {
            Precondition::None => {}
            Precondition::IfMatch(expected) => match current {
                Some(obj) if obj.revision.to_string() == expected.as_str() => {}
                _ => return Err(Error::Conflict(key.to_string())),
            },
            Precondition::IfAbsent => {
                if current.is_some() {
                    return Err(Error::Conflict(key.to_string()));
                }
            }
        }

        let revision = current.map(|obj| obj.revision + 1).unwrap_or(1);
        objects.insert(key.to_string(), StoredObject { body, revision });
        debug!(key, revision, "Store put");
        Ok(Version::new(revision.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        let v1 = store
            .put("k", b"one".to_vec(), Precondition::None)
            .await
            .unwrap();
        let (body, version) = store.get("k").await.unwrap().unwrap();
        assert_eq!(body, b"one");
        assert_eq!(version, v1);
    }

    #[tokio::test]
    async fn test_if_match_rejects_stale_version() {
        let store = MemoryStore::new();
        let v1 = store
            .put("k", b"one".to_vec(), Precondition::None)
            .await
            .unwrap();
        // concurrent writer bumps the version
        store
            .put("k", b"two".to_vec(), Precondition::None)
            .await
            .unwrap();

        let result = store
            .put("k", b"three".to_vec(), Precondition::IfMatch(v1))
            .await;
        assert!(matches!(result, Err(Error::Conflict(_))));

        let (body, _) = store.get("k").await.unwrap().unwrap();
        assert_eq!(body, b"two");
    }

    #[tokio::test]
    async fn test_if_match_accepts_current_version() {
        let store = MemoryStore::new();
        let v1 = store
            .put("k", b"one".to_vec(), Precondition::None)
            .await
            .unwrap();
        let v2 = store
            .put("k", b"two".to_vec(), Precondition::IfMatch(v1))
            .await
            .unwrap();
        assert_ne!(v2.as_str(), "1");
    }

    #[tokio::test]
    async fn test_if_absent_create_only() {
        let store = MemoryStore::new();
        store
            .put("k", b"one".to_vec(), Precondition::IfAbsent)
            .await
            .unwrap();
        let result = store.put("k", b"two".to_vec(), Precondition::IfAbsent).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }
}
