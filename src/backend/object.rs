//! Object-store-backed backend
//!
//! The variant that owns the core logic: every operation is a short
//! synchronous sequence of at most two store reads, local computation and
//! one store write, optionally followed by one best-effort webhook POST.
//! Nothing is cached across calls; the store is the only shared state.
//!
//! Usage writes are conditional on the version observed at read time and
//! the whole read-modify-write cycle retries on conflict, so concurrent
//! mutations of the same user lose no updates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use validator::Validate;

use crate::backend::Backend;
use crate::engine;
use crate::error::{Error, Result};
use crate::models::{FeatureMatrix, UsageRecord};
use crate::store::{matrix_key, usage_key, BlobStore, Precondition, Version};
use crate::webhook::{self, Notifier};

/// Tuning knobs for an [`ObjectBackend`]
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Deadline for each individual store call
    pub store_timeout: Duration,
    /// Deadline for each webhook delivery
    pub notifier_timeout: Duration,
    /// Read-modify-write retries before surfacing a conflict
    pub max_write_retries: u32,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            notifier_timeout: Duration::from_secs(30),
            max_write_retries: 3,
        }
    }
}

/// Backend running the gating logic against a [`BlobStore`]
pub struct ObjectBackend {
    project_id: String,
    store: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    options: BackendOptions,
}

impl ObjectBackend {
    pub fn new(
        project_id: impl Into<String>,
        store: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_options(project_id, store, notifier, BackendOptions::default())
    }

    pub fn with_options(
        project_id: impl Into<String>,
        store: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        options: BackendOptions,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            store,
            notifier,
            options,
        }
    }

    async fn store_get(&self, key: &str) -> Result<Option<(Vec<u8>, Version)>> {
        tokio::time::timeout(self.options.store_timeout, self.store.get(key))
            .await
            .map_err(|_| Error::StoreTimeout(self.options.store_timeout))?
    }

    async fn store_put(
        &self,
        key: &str,
        body: Vec<u8>,
        precondition: Precondition,
    ) -> Result<Version> {
        tokio::time::timeout(
            self.options.store_timeout,
            self.store.put(key, body, precondition),
        )
        .await
        .map_err(|_| Error::StoreTimeout(self.options.store_timeout))?
    }

    /// Fetch and decode the project's feature matrix
    async fn get_matrix(&self) -> Result<FeatureMatrix> {
        let key = matrix_key(&self.project_id);
        let Some((body, _)) = self.store_get(&key).await? else {
            return Err(Error::ConfigNotFound(key));
        };
        let matrix: FeatureMatrix = serde_json::from_slice(&body)?;
        // Advisory only: a questionable matrix (threshold above 1, an
        // enabled webhook without a url) still gates and accounts; failing
        // here would take the whole project down on decodable config.
        if let Err(e) = matrix.validate() {
            warn!(error = %e, "Feature matrix failed structural validation");
        }
        Ok(matrix)
    }

    /// Fetch the user's usage record with its store version, creating and
    /// persisting an empty record on first lookup.
    async fn get_usage(&self, user_id: &str) -> Result<(UsageRecord, Version)> {
        let key = usage_key(&self.project_id, user_id);
        if let Some((body, version)) = self.store_get(&key).await? {
            let record: UsageRecord = serde_json::from_slice(&body)?;
            return Ok((record, version));
        }

        info!(user_id, "Creating usage record for user");
        let record = UsageRecord::new(user_id);
        let body = serde_json::to_vec(&record)?;
        match self.store_put(&key, body, Precondition::IfAbsent).await {
            Ok(version) => Ok((record, version)),
            // Another writer created the record first; read theirs
            Err(Error::Conflict(_)) => {
                let Some((body, version)) = self.store_get(&key).await? else {
                    return Err(Error::Conflict(key));
                };
                let record: UsageRecord = serde_json::from_slice(&body)?;
                Ok((record, version))
            }
            Err(e) => Err(e),
        }
    }

    /// Read-modify-write a usage record under optimistic concurrency.
    /// Returns the record as written.
    async fn mutate_usage<F>(&self, user_id: &str, apply: F) -> Result<UsageRecord>
    where
        F: Fn(&mut UsageRecord),
    {
        let key = usage_key(&self.project_id, user_id);
        let mut attempt = 0;
        loop {
            let (mut record, version) = self.get_usage(user_id).await?;
            apply(&mut record);
            let body = serde_json::to_vec(&record)?;
            match self
                .store_put(&key, body, Precondition::IfMatch(version))
                .await
            {
                Ok(_) => return Ok(record),
                Err(Error::Conflict(_)) if attempt < self.options.max_write_retries => {
                    attempt += 1;
                    warn!(user_id, attempt, "Usage write conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Backend for ObjectBackend {
    async fn bind(&self, plan_id: &str, user_id: &str) -> Result<()> {
        info!(plan_id, user_id, "Binding user to plan");
        self.mutate_usage(user_id, |record| {
            record.plan_id = plan_id.to_string();
        })
        .await?;
        Ok(())
    }

    async fn feature(&self, plan_id: &str, feature_id: &str, user_id: &str) -> bool {
        let matrix = match self.get_matrix().await {
            Ok(matrix) => matrix,
            Err(e) => {
                warn!(feature_id, error = %e, "Failed to fetch feature matrix, deny");
                return false;
            }
        };
        let (usage, _) = match self.get_usage(user_id).await {
            Ok(usage) => usage,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to fetch usage record, deny");
                return false;
            }
        };
        engine::evaluate(&matrix, &usage, plan_id, feature_id)
    }

    async fn increment(&self, feature_id: &str, user_id: &str) -> Result<()> {
        let matrix = self.get_matrix().await?;
        info!(feature_id, user_id, "Incrementing usage");
        let record = self
            .mutate_usage(user_id, |record| {
                record.increment(feature_id);
            })
            .await?;
        webhook::evaluate_trigger(
            self.notifier.as_ref(),
            self.options.notifier_timeout,
            &matrix,
            &record,
            feature_id,
            user_id,
        )
        .await;
        Ok(())
    }

    async fn decrement(&self, feature_id: &str, user_id: &str) -> Result<()> {
        info!(feature_id, user_id, "Decrementing usage");
        self.mutate_usage(user_id, |record| {
            record.decrement(feature_id);
        })
        .await?;
        Ok(())
    }

    async fn set(&self, feature_id: &str, user_id: &str, value: i64) -> Result<()> {
        let matrix = self.get_matrix().await?;
        info!(feature_id, user_id, value, "Setting usage");
        let record = self
            .mutate_usage(user_id, |record| {
                record.set(feature_id, value);
            })
            .await?;
        webhook::evaluate_trigger(
            self.notifier.as_ref(),
            self.options.notifier_timeout,
            &matrix,
            &record,
            feature_id,
            user_id,
        )
        .await;
        Ok(())
    }

    async fn feature_matrix(&self) -> Result<FeatureMatrix> {
        self.get_matrix().await
    }

    async fn usage(&self, user_id: &str) -> Result<UsageRecord> {
        let (record, _) = self.get_usage(user_id).await?;
        Ok(record)
    }
}
