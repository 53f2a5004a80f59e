//! Observability for a single dispatch.
//!
//! Every reduction during a dispatch (the trigger message first, then one
//! per effect-produced message) records a [`TraceStep`]. Recording never
//! influences the dispatch outcome.

use reducible_state::{changed_keys, diff, Diff, StateMap, Value};
use serde::{Deserialize, Serialize};

/// One reduction within a dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub kind: String,
    pub payload: Value,
    pub diff: Diff,
    pub changed_keys: Vec<String>,
}

/// The causal chain of one dispatch against one node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub path: String,
    pub component_id: String,
    /// Node state before the first reduction.
    pub before: StateMap,
    /// Node state after the last reduction.
    pub after: StateMap,
    pub steps: Vec<TraceStep>,
}

impl Trace {
    pub(crate) fn new(path: &str, component_id: &str, before: StateMap) -> Self {
        Self {
            path: path.to_string(),
            component_id: component_id.to_string(),
            after: before.clone(),
            before,
            steps: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, kind: &str, payload: &Value, before: &StateMap, after: &StateMap) {
        let diff = diff(before, after);
        self.steps.push(TraceStep {
            kind: kind.to_string(),
            payload: payload.clone(),
            changed_keys: changed_keys(&diff),
            diff,
        });
        self.after = after.clone();
    }

    /// Message kinds in the order they were reduced.
    pub fn chain(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.kind.as_str()).collect()
    }

    /// Differences between the state before the dispatch and after it.
    pub fn net_diff(&self) -> Diff {
        diff(&self.before, &self.after)
    }

    /// The structure handed to debugging tooling.
    pub fn debug_payload(&self) -> DebugPayload {
        let trigger = self.steps.first();
        let changes = self.net_diff();
        DebugPayload {
            path: self.path.clone(),
            msg_type: trigger.map(|s| s.kind.clone()).unwrap_or_default(),
            payload: trigger.map(|s| s.payload.clone()),
            chain: self.steps.iter().map(|s| s.kind.clone()).collect(),
            changed_keys: changed_keys(&changes),
            changes,
            state: self.after.clone(),
        }
    }
}

/// JSON-serializable dispatch summary for debugging tooling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugPayload {
    pub path: String,
    pub msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payload: Option<Value>,
    pub chain: Vec<String>,
    pub changed_keys: Vec<String>,
    pub changes: Diff,
    pub state: StateMap,
}

impl DebugPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    fn state(count: i64, at: Value) -> StateMap {
        btree! {
            "count".to_string() => Value::from(count),
            "last_updated_at".to_string() => at,
        }
    }

    fn reset_trace() -> Trace {
        let s0 = state(5, Value::Null);
        let s1 = state(0, Value::Null);
        let s2 = state(0, Value::from("2025-01-01T00:00:00Z"));

        let mut trace = Trace::new("root", "Counter", s0.clone());
        trace.record("reset", &Value::map(), &s0, &s1);
        trace.record("reset_logged", &Value::map(), &s1, &s2);
        trace
    }

    #[test]
    fn chain_lists_kinds_in_order() {
        assert_eq!(reset_trace().chain(), vec!["reset", "reset_logged"]);
    }

    #[test]
    fn steps_carry_their_own_diff() {
        let trace = reset_trace();
        assert_eq!(trace.steps[0].changed_keys, vec!["count"]);
        assert_eq!(trace.steps[1].changed_keys, vec!["last_updated_at"]);
    }

    #[test]
    fn net_diff_spans_the_whole_chain() {
        let trace = reset_trace();
        assert_eq!(
            reducible_state::changed_keys(&trace.net_diff()),
            vec!["count", "last_updated_at"]
        );
    }

    #[test]
    fn empty_trace_has_no_changes() {
        let trace = Trace::new("root", "Counter", state(1, Value::Null));
        assert!(trace.chain().is_empty());
        assert!(trace.net_diff().is_empty());
        assert_eq!(trace.debug_payload().msg_type, "");
    }

    #[test]
    fn debug_payload_shape() {
        let json = serde_json::to_value(reset_trace().debug_payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "root",
                "msg_type": "reset",
                "payload": {},
                "chain": ["reset", "reset_logged"],
                "changed_keys": ["count", "last_updated_at"],
                "changes": {
                    "count": { "from": 5, "to": 0 },
                    "last_updated_at": { "from": null, "to": "2025-01-01T00:00:00Z" }
                },
                "state": { "count": 0, "last_updated_at": "2025-01-01T00:00:00Z" }
            })
        );
    }
}
