//! The older dictionary view of the event stream, kept for consumers that
//! still key on `"status"` and `"chunk"`.
//!
//! Producers of this view emitted a tool's extracted data before the tool's
//! end. Here `ToolCallEnd` comes first and maps to nothing, so the extracted
//! dictionary is still the first entry a tool result contributes.

use serde_json::{json, Map, Value};

use crate::config::{ParserConfig, StreamMode};
use crate::events::StreamEvent;

const STREAMING: &str = "streaming";

/// Maps one event to its dictionary form. Events the dictionary view never
/// carried (tool ends, state updates, usage) map to `None`.
pub fn to_legacy_value(event: &StreamEvent) -> Option<Value> {
    let value = match event {
        StreamEvent::Content { content, node, .. } => with_node(
            json!({"chunk": content, "status": STREAMING}),
            node.as_deref(),
        ),
        StreamEvent::ToolCallStart { id, name, args, node } => with_node(
            json!({
                "tool_calls": [{"id": id, "name": name, "args": args}],
                "status": STREAMING,
            }),
            node.as_deref(),
        ),
        StreamEvent::ToolExtracted {
            tool_name,
            extracted_type,
            data,
        } => match extracted_type.as_str() {
            "reflection" => json!({"chunk": data, "status": STREAMING}),
            "todos" => json!({"todo_list": data, "status": STREAMING}),
            _ => json!({
                "extracted": {"tool": tool_name, "type": extracted_type, "data": data},
                "status": STREAMING,
            }),
        },
        StreamEvent::Interrupt(interrupt) => json!({
            "interrupt": {
                "action_requests": interrupt.action_requests,
                "review_configs": interrupt.review_configs,
            },
            "status": "interrupt",
        }),
        StreamEvent::Complete => json!({"status": "complete"}),
        StreamEvent::Error { message, .. } => json!({"error": message, "status": "error"}),
        StreamEvent::ToolCallEnd { .. }
        | StreamEvent::StateUpdate { .. }
        | StreamEvent::Usage { .. } => return None,
    };
    Some(value)
}

/// Adapts an event iterator to the dictionary view, dropping unmapped events.
pub fn legacy_values<I>(events: I) -> impl Iterator<Item = Value>
where
    I: IntoIterator<Item = StreamEvent>,
{
    events
        .into_iter()
        .filter_map(|event| to_legacy_value(&event))
}

/// Settings the dictionary view was produced with: lifecycle tracking on and
/// the reflection and todo tools hidden from the tool-call output.
pub fn legacy_config(stream_mode: StreamMode) -> ParserConfig {
    ParserConfig {
        stream_mode,
        skip_tools: ["think_tool", "write_todos"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        ..ParserConfig::default()
    }
}

fn with_node(mut value: Value, node: Option<&str>) -> Value {
    if let (Value::Object(map), Some(node)) = (&mut value, node) {
        insert_node(map, node);
    }
    value
}

fn insert_node(map: &mut Map<String, Value>, node: &str) {
    if !node.is_empty() {
        map.insert("node".to_string(), Value::String(node.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{InterruptEvent, Role, ToolOutcome};

    #[test]
    fn content_and_tool_start() {
        let content = StreamEvent::content("Hi", Role::Assistant, Some("agent"));
        assert_eq!(
            to_legacy_value(&content),
            Some(json!({"chunk": "Hi", "status": "streaming", "node": "agent"}))
        );

        let start = StreamEvent::ToolCallStart {
            id: "c1".to_string(),
            name: "search".to_string(),
            args: json!({"q": "x"}),
            node: None,
        };
        assert_eq!(
            to_legacy_value(&start),
            Some(json!({
                "tool_calls": [{"id": "c1", "name": "search", "args": {"q": "x"}}],
                "status": "streaming"
            }))
        );
    }

    #[test]
    fn extracted_variants() {
        let todos = StreamEvent::ToolExtracted {
            tool_name: "write_todos".to_string(),
            extracted_type: "todos".to_string(),
            data: json!([{"content": "a"}]),
        };
        assert_eq!(
            to_legacy_value(&todos),
            Some(json!({"todo_list": [{"content": "a"}], "status": "streaming"}))
        );

        let custom = StreamEvent::ToolExtracted {
            tool_name: "chart".to_string(),
            extracted_type: "chart".to_string(),
            data: json!({"points": 3}),
        };
        assert_eq!(
            to_legacy_value(&custom).unwrap()["extracted"]["tool"],
            json!("chart")
        );
    }

    #[test]
    fn unmapped_and_terminal_events() {
        let end = StreamEvent::ToolCallEnd {
            id: "c1".to_string(),
            name: "search".to_string(),
            result: json!("ok"),
            status: ToolOutcome::Success,
            error_message: None,
            duration_ms: None,
        };
        assert_eq!(to_legacy_value(&end), None);
        assert_eq!(
            to_legacy_value(&StreamEvent::Complete),
            Some(json!({"status": "complete"}))
        );

        let interrupt = StreamEvent::Interrupt(InterruptEvent {
            action_requests: Vec::new(),
            review_configs: Vec::new(),
            raw_value: Value::Null,
        });
        let mapped: Vec<_> = legacy_values([interrupt, end, StreamEvent::Complete]).collect();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0]["status"], "interrupt");
    }

    #[test]
    fn legacy_config_hides_internal_tools() {
        let config = legacy_config(StreamMode::updates());
        assert!(config.skips("think_tool"));
        assert!(config.skips("write_todos"));
        assert!(config.track_tool_lifecycle);
    }
}
