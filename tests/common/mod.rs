//! Common test utilities and fixtures

// Test utilities may not all be used in every test
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use plangate::error::{Error, Result};
use plangate::store::{BlobStore, MemoryStore, Precondition, Version};
use plangate::webhook::Notifier;
use plangate::{Feature, FeatureKind, FeatureMatrix, Plan, WebhookConfig};

/// One captured webhook delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    pub url: String,
    pub token: String,
    pub body: String,
}

/// Notifier that records deliveries instead of making HTTP calls
#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, url: &str, token: &str, body: &str) -> Result<()> {
        self.deliveries.lock().unwrap().push(Delivery {
            url: url.to_string(),
            token: token.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Store whose every call fails, for deny-on-backend-failure tests
pub struct FailingStore;

#[async_trait]
impl BlobStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<(Vec<u8>, Version)>> {
        Err(Error::Transport("storage unreachable".to_string()))
    }

    async fn put(&self, _key: &str, _body: Vec<u8>, _precondition: Precondition) -> Result<Version> {
        Err(Error::Transport("storage unreachable".to_string()))
    }
}

/// Store that defeats every conditional write by bumping the object
/// version between the caller's read and write
pub struct ContendedStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl BlobStore for ContendedStore {
    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, Version)>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, body: Vec<u8>, precondition: Precondition) -> Result<Version> {
        if let Precondition::IfMatch(_) = &precondition {
            if let Some((current, _)) = self.inner.get(key).await? {
                self.inner.put(key, current, Precondition::None).await?;
            }
        }
        self.inner.put(key, body, precondition).await
    }
}

/// Counter feature with a hard or soft limit
pub fn counter_feature(id: &str, limit: i64, soft: bool) -> Feature {
    Feature {
        feature_id: id.to_string(),
        kind: FeatureKind::Counter,
        value: limit,
        enabled: true,
        soft,
        webhook: WebhookConfig::default(),
    }
}

/// Boolean feature with the given flag value
pub fn boolean_feature(id: &str, flag: i64) -> Feature {
    Feature {
        feature_id: id.to_string(),
        kind: FeatureKind::Boolean,
        value: flag,
        enabled: true,
        soft: false,
        webhook: WebhookConfig::default(),
    }
}

/// Single-plan matrix fixture
pub fn single_plan_matrix(plan_id: &str, features: Vec<Feature>) -> FeatureMatrix {
    FeatureMatrix {
        plans: vec![Plan {
            plan_id: plan_id.to_string(),
            features,
        }],
    }
}

/// Webhook config pointing at a fake URL with the canonical payload
pub fn test_webhook(threshold: f64) -> WebhookConfig {
    WebhookConfig {
        enabled: true,
        url: "https://hooks.example.com/usage".to_string(),
        token: "hook-token".to_string(),
        threshold,
        payload: concat!(
            r#"{"user_id":"{{user_id}}","feature_id":"{{feature_id}}","#,
            r#""usage":"{{usage}}","limit":"{{limit}}"}"#
        )
        .to_string(),
    }
}

/// Seed a matrix blob into a store under the project's matrix key
pub async fn seed_matrix(store: &MemoryStore, project_id: &str, matrix: &FeatureMatrix) {
    let key = plangate::store::matrix_key(project_id);
    let body = serde_json::to_vec(matrix).unwrap();
    store.put(&key, body, Precondition::None).await.unwrap();
}
