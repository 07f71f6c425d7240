//! Decision engine
//!
//! Pure allow/deny evaluation over a freshly fetched feature matrix and
//! usage record. Performs no I/O and no writes.
//!
//! Lookup failures deny: an unknown plan or an unknown feature is treated
//! as a misconfiguration, not a free pass.

use tracing::{debug, info};

use crate::models::{FeatureKind, FeatureMatrix, UsageRecord};

/// Decide whether `user`'s next invocation of `feature_id` under `plan_id`
/// is allowed.
///
/// Rules, in order, for the first feature in the plan with a matching id:
/// disabled features allow; boolean features allow iff their flag is 1;
/// soft limits always allow; hard counters allow while usage is strictly
/// below the limit, and allow when the feature has never been metered for
/// this user.
pub fn evaluate(
    matrix: &FeatureMatrix,
    usage: &UsageRecord,
    plan_id: &str,
    feature_id: &str,
) -> bool {
    let Some(plan) = matrix.find_plan(plan_id) else {
        info!(plan_id, feature_id, "Plan not found in matrix, deny");
        return false;
    };
    let Some(feature) = plan.find_feature(feature_id) else {
        info!(plan_id, feature_id, "Feature not found in plan, deny");
        return false;
    };

    if !feature.enabled {
        info!(feature_id, "Feature disabled, allow");
        return true;
    }

    if feature.kind == FeatureKind::Boolean {
        return feature.value == 1;
    }

    if feature.soft {
        info!(feature_id, "Feature is soft, allow");
        return true;
    }

    match usage.counter(feature_id) {
        Some(current) => {
            let allow = current < feature.value;
            debug!(feature_id, current, limit = feature.value, allow, "Hard limit check");
            allow
        }
        // Feature granted by the plan but not yet metered for this user
        None => true,
    }
}
