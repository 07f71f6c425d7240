//! Usage ledger model
//!
//! One record per user: the plan binding and a per-feature counter map.
//! Records are created lazily on first lookup and persisted immediately.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-user durable usage counters and plan binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Owning user
    pub user_id: String,
    /// Bound plan; empty means unbound. Always emitted, even when empty;
    /// records written without the field still decode as unbound.
    #[serde(default)]
    pub plan_id: String,
    /// Counters keyed by feature id. Signed because `set` writes
    /// arbitrary values without clamping.
    #[serde(default)]
    pub usage: BTreeMap<String, i64>,
}

impl UsageRecord {
    /// Fresh unbound record with no usage
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            plan_id: String::new(),
            usage: BTreeMap::new(),
        }
    }

    /// Whether the user is bound to a plan
    pub fn is_bound(&self) -> bool {
        !self.plan_id.is_empty()
    }

    /// Counter value for a feature, if the feature has ever been metered
    pub fn counter(&self, feature_id: &str) -> Option<i64> {
        self.usage.get(feature_id).copied()
    }

    /// Add 1 to a counter, creating it at 1. Returns the new value.
    pub fn increment(&mut self, feature_id: &str) -> i64 {
        let entry = self.usage.entry(feature_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Subtract 1 from a counter, flooring at 0. Returns the new value.
    ///
    /// A feature with no entry is left unmetered: creating a zero entry
    /// here would flip the gate for a limit-0 counter from allow
    /// (never metered) to deny.
    pub fn decrement(&mut self, feature_id: &str) -> i64 {
        match self.usage.get_mut(feature_id) {
            Some(entry) if *entry > 0 => {
                *entry -= 1;
                *entry
            }
            Some(entry) => *entry,
            None => 0,
        }
    }

    /// Overwrite a counter unconditionally. No clamping: negative and
    /// over-limit values are stored as given.
    pub fn set(&mut self, feature_id: &str, value: i64) {
        self.usage.insert(feature_id.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut record = UsageRecord::new("u1");
        record.plan_id = "pro".to_string();
        record.set("api-calls", 42);
        let json = serde_json::to_string(&record).unwrap();
        let decoded: UsageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_unbound_plan_serializes_empty() {
        let record = UsageRecord::new("u1");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""plan_id":"""#));
        let decoded: UsageRecord = serde_json::from_str(&json).unwrap();
        assert!(!decoded.is_bound());
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_absent_plan_id_decodes_as_unbound() {
        let record: UsageRecord =
            serde_json::from_str(r#"{"user_id":"u1","usage":{}}"#).unwrap();
        assert!(!record.is_bound());
        assert_eq!(record.plan_id, "");
    }

    #[test]
    fn test_increment_creates_at_one() {
        let mut record = UsageRecord::new("u1");
        assert_eq!(record.increment("f"), 1);
        assert_eq!(record.increment("f"), 2);
        assert_eq!(record.counter("f"), Some(2));
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut record = UsageRecord::new("u1");
        record.set("f", 1);
        assert_eq!(record.decrement("f"), 0);
        assert_eq!(record.decrement("f"), 0);
        assert_eq!(record.counter("f"), Some(0));
    }

    #[test]
    fn test_decrement_absent_feature_stays_unmetered() {
        let mut record = UsageRecord::new("u1");
        assert_eq!(record.decrement("f"), 0);
        assert_eq!(record.counter("f"), None);
        assert!(record.usage.is_empty());
    }

    #[test]
    fn test_decrement_leaves_negative_counters_alone() {
        let mut record = UsageRecord::new("u1");
        record.set("f", -2);
        assert_eq!(record.decrement("f"), -2);
        assert_eq!(record.counter("f"), Some(-2));
    }

    #[test]
    fn test_set_does_not_clamp() {
        let mut record = UsageRecord::new("u1");
        record.set("f", -7);
        assert_eq!(record.counter("f"), Some(-7));
        record.set("f", 1_000_000);
        assert_eq!(record.counter("f"), Some(1_000_000));
    }
}
