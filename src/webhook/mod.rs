//! Threshold webhook trigger and delivery
//!
//! After a mutating accounting call, the trigger compares the updated
//! usage against the feature's limit and, past the configured threshold,
//! POSTs the rendered payload template to the configured URL.
//!
//! Delivery is fire-and-forget: failures and timeouts are logged and
//! never surface to the caller, and nothing is retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{FeatureMatrix, UsageRecord, WebhookConfig};

/// Placeholder for the user id, replaced with the literal string
const USER_ID_PLACEHOLDER: &str = "{{user_id}}";
/// Placeholder for the feature id, replaced with the literal string
const FEATURE_ID_PLACEHOLDER: &str = "{{feature_id}}";
/// Quoted numeric placeholders. The quotes are part of the pattern so the
/// substituted value lands as a JSON numeric literal.
const USAGE_PLACEHOLDER: &str = "\"{{usage}}\"";
const LIMIT_PLACEHOLDER: &str = "\"{{limit}}\"";

/// Outbound delivery capability consumed by the trigger
#[async_trait]
pub trait Notifier: Send + Sync {
    /// POST `body` to `url` with `Authorization: token` and a JSON
    /// content type.
    async fn deliver(&self, url: &str, token: &str, body: &str) -> Result<()>;
}

/// reqwest-backed notifier with a shared client
pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("plangate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(&self, url: &str, token: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Delivery(format!(
                "webhook endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Render the payload template for one delivery.
///
/// Literal string replacement, not a templating engine: `{{user_id}}` and
/// `{{feature_id}}` become the raw strings (not JSON-escaped), and the
/// quoted `"{{usage}}"` / `"{{limit}}"` become unquoted numeric literals.
pub fn render_payload(
    template: &str,
    user_id: &str,
    feature_id: &str,
    usage: i64,
    limit: i64,
) -> String {
    template
        .replace(USER_ID_PLACEHOLDER, user_id)
        .replace(FEATURE_ID_PLACEHOLDER, feature_id)
        .replace(USAGE_PLACEHOLDER, &usage.to_string())
        .replace(LIMIT_PLACEHOLDER, &limit.to_string())
}

/// Whether a webhook should fire for `current` usage against `limit`.
///
/// A zero limit with positive usage counts as an infinite ratio and
/// always fires; zero or negative usage against a zero limit never does
/// (the ratio would be NaN or negative infinity).
fn past_threshold(current: i64, limit: i64, threshold: f64) -> bool {
    if limit == 0 {
        return current > 0;
    }
    (current as f64) / (limit as f64) > threshold
}

fn scheme_is_supported(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Evaluate the threshold trigger after a mutating accounting call.
///
/// Looks up the first feature across plans with a matching id and an
/// enabled webhook; fires at most one delivery per call.
pub async fn evaluate_trigger(
    notifier: &dyn Notifier,
    deadline: Duration,
    matrix: &FeatureMatrix,
    usage: &UsageRecord,
    feature_id: &str,
    user_id: &str,
) {
    let Some(feature) = matrix
        .plans
        .iter()
        .flat_map(|p| p.features.iter())
        .find(|f| f.feature_id == feature_id && f.webhook.enabled)
    else {
        return;
    };

    let current = usage.counter(feature_id).unwrap_or(0);
    let hook = &feature.webhook;
    if !past_threshold(current, feature.value, hook.threshold) {
        return;
    }

    dispatch(notifier, deadline, hook, user_id, feature_id, current, feature.value).await;
}

async fn dispatch(
    notifier: &dyn Notifier,
    deadline: Duration,
    hook: &WebhookConfig,
    user_id: &str,
    feature_id: &str,
    current: i64,
    limit: i64,
) {
    if !scheme_is_supported(&hook.url) {
        warn!(user_id, url = %hook.url, "Webhook URL scheme not supported, skipping");
        return;
    }

    info!(user_id, url = %hook.url, "Triggering webhook");
    let body = render_payload(&hook.payload, user_id, feature_id, current, limit);

    match tokio::time::timeout(deadline, notifier.deliver(&hook.url, &hook.token, &body)).await {
        Ok(Ok(())) => {
            info!(user_id, url = %hook.url, "Webhook delivered");
        }
        Ok(Err(e)) => {
            warn!(user_id, url = %hook.url, error = %e, "Webhook delivery failed");
        }
        Err(_) => {
            let e = Error::NotifierTimeout(deadline);
            warn!(user_id, url = %hook.url, error = %e, "Webhook delivery failed");
        }
    }
}
