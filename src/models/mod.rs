//! Data models for plangate
//!
//! Wire-format structs for the feature matrix and the per-user usage
//! ledger. Field names match the persisted JSON layout exactly.

mod matrix;
mod usage;

pub use matrix::{Feature, FeatureKind, FeatureMatrix, Plan, WebhookConfig};
pub use usage::UsageRecord;
