//! Feature matrix models
//!
//! A project's full gating configuration: an ordered list of plans, each
//! bundling the features it entitles. The matrix is fetched fresh on every
//! operation so configuration edits take effect on the next call.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Full gating configuration for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureMatrix {
    /// Ordered plan list; `plan_id` is unique within a matrix
    #[validate(nested)]
    #[serde(default)]
    pub plans: Vec<Plan>,
}

/// A named bundle of feature entitlements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Plan {
    /// Plan identifier, unique within the matrix
    #[validate(length(min = 1, message = "plan_id must not be empty"))]
    pub plan_id: String,
    /// Features gated by this plan
    #[validate(nested)]
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// Feature type discriminator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// On/off toggle; `value` is the flag (1 = on), usage is ignored
    Boolean,
    /// Metered feature; `value` is the usage limit
    #[default]
    Counter,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureKind::Boolean => write!(f, "boolean"),
            FeatureKind::Counter => write!(f, "counter"),
        }
    }
}

/// One meterable or boolean capability within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Feature {
    /// Feature identifier. Unique within a plan's feature list; on a
    /// duplicate the first entry in list order wins.
    #[validate(length(min = 1, message = "feature_id must not be empty"))]
    pub feature_id: String,
    /// Feature type
    #[serde(rename = "type", default)]
    pub kind: FeatureKind,
    /// Usage limit for counter features, boolean flag (0/1) otherwise
    #[serde(default, skip_serializing_if = "is_zero")]
    pub value: i64,
    /// Whether gating is enforced at all; a disabled feature allows freely
    #[serde(default)]
    pub enabled: bool,
    /// Soft limits track usage but never deny
    #[serde(default)]
    pub soft: bool,
    /// Threshold notification settings
    #[validate(nested)]
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Threshold webhook settings for one feature
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_webhook_target"))]
pub struct WebhookConfig {
    /// Whether the webhook fires at all
    #[serde(default)]
    pub enabled: bool,
    /// Target URL for the POST
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Sent verbatim as the Authorization header
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Fraction of the limit that triggers the notification. Typically
    /// within [0, 1]; larger values are meaningful for soft limits, so
    /// the range check is advisory.
    #[validate(range(min = 0.0, max = 1.0, message = "threshold must be within [0, 1]"))]
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub threshold: f64,
    /// JSON body template; see webhook module for the placeholder set
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

/// An enabled webhook without a target URL can never be dispatched
fn validate_webhook_target(webhook: &WebhookConfig) -> Result<(), validator::ValidationError> {
    if webhook.enabled && webhook.url.is_empty() {
        let mut err = validator::ValidationError::new("missing_webhook_url");
        err.message = Some(std::borrow::Cow::Borrowed(
            "webhook is enabled but has no url",
        ));
        return Err(err);
    }
    Ok(())
}

impl FeatureMatrix {
    /// Find a plan by id
    pub fn find_plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.plan_id == plan_id)
    }

    /// Find a feature by id across all plans, in matrix order
    pub fn find_feature(&self, feature_id: &str) -> Option<&Feature> {
        self.plans
            .iter()
            .flat_map(|p| p.features.iter())
            .find(|f| f.feature_id == feature_id)
    }
}

impl Plan {
    /// Find a feature by id; first match wins on duplicates
    pub fn find_feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.feature_id == feature_id)
    }
}
