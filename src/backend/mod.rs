//! Backend abstraction
//!
//! One capability trait over two transports: [`ObjectBackend`] runs the
//! decision and accounting logic against a blob store, [`ApiBackend`]
//! delegates every operation to a remote gating service. Both expose
//! identical semantics; callers pick one at construction time.

mod api;
mod object;

pub use api::{ApiBackend, DEFAULT_API_BASE};
pub use object::{BackendOptions, ObjectBackend};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FeatureMatrix, UsageRecord};

/// Public operation surface consumed by application backends.
///
/// `feature` is a boolean gate and never errors: any backend failure
/// degrades to deny. The accounting operations surface failures so the
/// caller can retry; a failed call means the usage was not recorded.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Bind a user to a plan. Idempotent.
    async fn bind(&self, plan_id: &str, user_id: &str) -> Result<()>;

    /// Whether the user may invoke the feature under the plan right now
    async fn feature(&self, plan_id: &str, feature_id: &str, user_id: &str) -> bool;

    /// Add 1 to the user's counter, then evaluate the threshold webhook
    async fn increment(&self, feature_id: &str, user_id: &str) -> Result<()>;

    /// Subtract 1 from the user's counter, flooring at 0. No webhook.
    async fn decrement(&self, feature_id: &str, user_id: &str) -> Result<()>;

    /// Overwrite the user's counter, then evaluate the threshold webhook
    async fn set(&self, feature_id: &str, user_id: &str, value: i64) -> Result<()>;

    /// Fetch the project's current feature matrix
    async fn feature_matrix(&self) -> Result<FeatureMatrix>;

    /// Fetch the user's usage record, creating an empty one on first use
    async fn usage(&self, user_id: &str) -> Result<UsageRecord>;
}
