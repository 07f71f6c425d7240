//! Blob store capability
//!
//! The durable side of the system: an object store holding JSON blobs at
//! deterministic keys. The store exclusively owns persistent state; the
//! rest of the crate works on transient copies fetched per call.
//!
//! Writes carry a precondition so the accounting operations can do
//! optimistic concurrency instead of blind last-writer-wins.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;

/// Opaque version token attached to every stored object, in the style of
/// an HTTP ETag. Compared only for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Precondition for a write
#[derive(Debug, Clone)]
pub enum Precondition {
    /// Unconditional write
    None,
    /// Write only if the stored version still matches
    IfMatch(Version),
    /// Write only if no object exists at the key
    IfAbsent,
}

/// Versioned object storage over raw bytes.
///
/// Implementations map this onto whatever transport they have (S3-style
/// object storage, a local directory, an in-process map). A failed
/// precondition must surface [`crate::Error::Conflict`] with the key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch an object and its current version. `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, Version)>>;

    /// Store an object, subject to the precondition. Returns the new
    /// version on success.
    async fn put(&self, key: &str, body: Vec<u8>, precondition: Precondition) -> Result<Version>;
}

/// Key of the feature matrix blob for a project
pub fn matrix_key(project_id: &str) -> String {
    format!("{}/feature_matrix.json", project_id)
}

/// Key of one user's usage record blob
pub fn usage_key(project_id: &str, user_id: &str) -> String {
    format!("{}/users/{}.json", project_id, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(matrix_key("proj"), "proj/feature_matrix.json");
        assert_eq!(usage_key("proj", "alice"), "proj/users/alice.json");
    }
}
