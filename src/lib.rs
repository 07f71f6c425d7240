//! plangate
//!
//! Feature gating and usage accounting across pricing plans. A project's
//! feature matrix defines, per plan, which features are boolean toggles
//! and which are metered counters with hard or soft limits; a per-user
//! usage ledger backs the allow/deny decision. Usage crossing a
//! configured threshold fires a templated webhook.
//!
//! The [`backend::Backend`] trait is the public surface. Pick the
//! [`backend::ObjectBackend`] to run the gating logic against an object
//! store, or the [`backend::ApiBackend`] to delegate to a remote gating
//! service.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod store;
pub mod webhook;

pub use backend::{ApiBackend, Backend, BackendOptions, ObjectBackend};
pub use error::{Error, Result};
pub use models::{Feature, FeatureKind, FeatureMatrix, Plan, UsageRecord, WebhookConfig};
