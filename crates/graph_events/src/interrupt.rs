//! Canonicalizes human-approval interrupt payloads.
//!
//! Accepted shapes of the value stored under the reserved `__interrupt__` key:
//! - `[{"value": {"action_requests": [...], "review_configs": [...]}}, ...]`:
//!   one or more interrupt objects; their lists are concatenated in order.
//! - `[[...action_requests], [...review_configs]]`: a bare pair of lists.
//! - `{"action_requests": [...], "review_configs": [...]}`: a bare object.
//!
//! Anything else degrades to empty lists; the raw value is always preserved.

use serde_json::{Map, Value};

use crate::events::{ActionRequest, InterruptEvent, ReviewConfig};
use crate::shape::empty_object;

/// Reserved update-channel key carrying an interrupt.
pub const INTERRUPT_KEY: &str = "__interrupt__";

pub fn canonicalize_interrupt(raw: &Value) -> InterruptEvent {
    let (actions, configs) = split_interrupt_value(raw);

    InterruptEvent {
        action_requests: actions
            .iter()
            .enumerate()
            .map(|(index, action)| action_request(action, index))
            .collect(),
        review_configs: configs.iter().copied().map(review_config).collect(),
        raw_value: raw.clone(),
    }
}

fn split_interrupt_value(raw: &Value) -> (Vec<&Value>, Vec<&Value>) {
    match raw {
        Value::Array(items) => {
            let wraps_interrupts = items
                .first()
                .and_then(Value::as_object)
                .is_some_and(|first| first.contains_key("value"));

            match items.as_slice() {
                [single] if !wraps_interrupts => lists_of(single),
                [Value::Array(actions), Value::Array(configs)] if !wraps_interrupts => {
                    (actions.iter().collect(), configs.iter().collect())
                }
                _ => {
                    let mut actions = Vec::new();
                    let mut configs = Vec::new();
                    for item in items {
                        let (a, c) = lists_of(item);
                        actions.extend(a);
                        configs.extend(c);
                    }
                    (actions, configs)
                }
            }
        }
        other => lists_of(other),
    }
}

/// Lists from one interrupt object, unwrapping its `value` payload if present.
fn lists_of(obj: &Value) -> (Vec<&Value>, Vec<&Value>) {
    let Some(map) = obj.as_object() else {
        return (Vec::new(), Vec::new());
    };
    let source = match map.get("value").and_then(Value::as_object) {
        Some(inner) => inner,
        None => map,
    };
    (list(source, "action_requests"), list(source, "review_configs"))
}

fn list<'a>(map: &'a Map<String, Value>, key: &str) -> Vec<&'a Value> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn action_request(action: &Value, index: usize) -> ActionRequest {
    let fallback_id = || format!("call_{index}");
    let Some(map) = action.as_object() else {
        return ActionRequest {
            tool: None,
            tool_call_id: fallback_id(),
            args: empty_object(),
            description: None,
        };
    };

    let text = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    ActionRequest {
        tool: text("tool").or_else(|| text("name")),
        tool_call_id: text("tool_call_id").unwrap_or_else(fallback_id),
        args: map
            .get("args")
            .filter(|args| !args.is_null())
            .cloned()
            .unwrap_or_else(empty_object),
        description: text("description"),
    }
}

fn review_config(config: &Value) -> ReviewConfig {
    let allowed_decisions = config
        .get("allowed_decisions")
        .and_then(Value::as_array)
        .map(|kinds| {
            kinds
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    ReviewConfig { allowed_decisions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_interrupt_object() {
        let raw = json!([{
            "value": {
                "action_requests": [
                    {"name": "bash", "args": {"command": "ls -la"}, "tool_call_id": "call_9"}
                ],
                "review_configs": [{"allowed_decisions": ["approve", "reject", "edit"]}]
            },
            "resumable": true
        }]);

        let event = canonicalize_interrupt(&raw);
        assert_eq!(event.action_requests.len(), 1);
        let action = &event.action_requests[0];
        assert_eq!(action.tool.as_deref(), Some("bash"));
        assert_eq!(action.tool_call_id, "call_9");
        assert_eq!(action.args, json!({"command": "ls -la"}));
        assert_eq!(
            event.review_configs[0].allowed_decisions,
            vec!["approve", "reject", "edit"]
        );
        assert_eq!(event.raw_value, raw);
    }

    #[test]
    fn multiple_interrupt_objects_are_concatenated() {
        let raw = json!([
            {"value": {"action_requests": [{"tool": "a"}], "review_configs": []}},
            {"value": {"action_requests": [{"tool": "b"}], "review_configs": [{"allowed_decisions": ["approve"]}]}}
        ]);
        let event = canonicalize_interrupt(&raw);
        let tools: Vec<_> = event
            .action_requests
            .iter()
            .map(|a| a.tool.as_deref().unwrap())
            .collect();
        assert_eq!(tools, vec!["a", "b"]);
        assert_eq!(event.action_requests[1].tool_call_id, "call_1");
        assert_eq!(event.review_configs.len(), 1);
    }

    #[test]
    fn pair_of_lists() {
        let raw = json!([
            [{"tool": "write_file", "args": {"path": "/tmp/x"}, "description": "write it"}],
            [{"allowed_decisions": ["approve"]}]
        ]);
        let event = canonicalize_interrupt(&raw);
        assert_eq!(event.action_requests[0].tool.as_deref(), Some("write_file"));
        assert_eq!(event.action_requests[0].tool_call_id, "call_0");
        assert_eq!(
            event.action_requests[0].description.as_deref(),
            Some("write it")
        );
        assert_eq!(event.review_configs[0].allowed_decisions, vec!["approve"]);
    }

    #[test]
    fn bare_object_prefers_tool_over_name() {
        let raw = json!({
            "action_requests": [{"tool": "primary", "name": "secondary"}, {"name": "only_name"}],
            "review_configs": []
        });
        let event = canonicalize_interrupt(&raw);
        assert_eq!(event.action_requests[0].tool.as_deref(), Some("primary"));
        assert_eq!(event.action_requests[1].tool.as_deref(), Some("only_name"));
        assert_eq!(event.action_requests[1].tool_call_id, "call_1");
    }

    #[test]
    fn malformed_values_degrade_to_empty_lists() {
        for raw in [
            json!("Please confirm you want to proceed"),
            json!([{"value": "Please confirm"}]),
            json!(42),
            json!([]),
            json!({"action_requests": "not a list"}),
        ] {
            let event = canonicalize_interrupt(&raw);
            assert!(event.action_requests.is_empty(), "{raw}");
            assert!(event.review_configs.is_empty(), "{raw}");
            assert!(!event.needs_approval());
            assert_eq!(event.raw_value, raw);
        }
    }
}
