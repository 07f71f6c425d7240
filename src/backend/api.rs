//! Remote-API backend
//!
//! Thin delegate: every operation is one POST to a fixed endpoint path
//! under the service base URL, carrying the project id plus the
//! operation-specific fields. The far end runs the decision and
//! accounting logic; this side only speaks the wire contract.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::models::{FeatureMatrix, UsageRecord};

use async_trait::async_trait;

/// Hosted gating service, used when no base URL is configured
pub const DEFAULT_API_BASE: &str = "https://api.plangate.dev/api/v1";

/// Gate decision returned by the `/feature` endpoint
#[derive(Debug, Deserialize)]
struct FeatureResponse {
    allow: bool,
    #[serde(default)]
    reason: String,
}

/// Backend delegating every operation to a remote gating service
pub struct ApiBackend {
    client: Client,
    base_url: String,
    api_token: String,
    project_id: String,
    timeout: Duration,
}

impl ApiBackend {
    pub fn new(
        project_id: impl Into<String>,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self::with_timeout(project_id, base_url, api_token, Duration::from_secs(10))
    }

    pub fn with_timeout(
        project_id: impl Into<String>,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("plangate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            project_id: project_id.into(),
            timeout,
        }
    }

    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::StoreTimeout(self.timeout)
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl Backend for ApiBackend {
    async fn bind(&self, plan_id: &str, user_id: &str) -> Result<()> {
        self.post(
            "/bind",
            json!({
                "project_id": self.project_id,
                "plan_id": plan_id,
                "user_id": user_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn feature(&self, plan_id: &str, feature_id: &str, user_id: &str) -> bool {
        let result = self
            .post(
                "/feature",
                json!({
                    "project_id": self.project_id,
                    "plan_id": plan_id,
                    "feature_id": feature_id,
                    "user_id": user_id,
                }),
            )
            .await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(feature_id, error = %e, "Feature check request failed, deny");
                return false;
            }
        };
        let decision: FeatureResponse = match response.json().await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(feature_id, error = %e, "Feature check decode failed, deny");
                return false;
            }
        };
        if !decision.reason.is_empty() {
            info!(feature_id, reason = %decision.reason, "Feature decision");
        }
        decision.allow
    }

    async fn increment(&self, feature_id: &str, user_id: &str) -> Result<()> {
        self.post(
            "/increment",
            json!({
                "project_id": self.project_id,
                "feature_id": feature_id,
                "user_id": user_id,
                "value": 1,
            }),
        )
        .await?;
        Ok(())
    }

    async fn decrement(&self, feature_id: &str, user_id: &str) -> Result<()> {
        self.post(
            "/decrement",
            json!({
                "project_id": self.project_id,
                "feature_id": feature_id,
                "user_id": user_id,
                "value": 1,
            }),
        )
        .await?;
        Ok(())
    }

    async fn set(&self, feature_id: &str, user_id: &str, value: i64) -> Result<()> {
        self.post(
            "/set",
            json!({
                "project_id": self.project_id,
                "feature_id": feature_id,
                "user_id": user_id,
                "value": value,
            }),
        )
        .await?;
        Ok(())
    }

    async fn feature_matrix(&self) -> Result<FeatureMatrix> {
        let response = self
            .post("/feature-matrix", json!({ "project_id": self.project_id }))
            .await?;
        let matrix = response
            .json::<FeatureMatrix>()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(matrix)
    }

    async fn usage(&self, user_id: &str) -> Result<UsageRecord> {
        let response = self
            .post(
                "/usage",
                json!({
                    "project_id": self.project_id,
                    "user_id": user_id,
                }),
            )
            .await?;
        let record = response
            .json::<UsageRecord>()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(record)
    }
}
