//! Narrow accessors over the loosely shaped message payloads the upstream
//! runtime serializes.
//!
//! A message reaches us in one of three shapes:
//! - flat: `{"type": "ai", "content": ..., ...}`
//! - wrapped: `{"type": "ai", "data": {...}}`
//! - constructor: `{"lc": 1, "type": "constructor", "id": [..., "AIMessage"], "kwargs": {...}}`
//!
//! [`MessageView`] resolves the shape once; every field accessor goes through
//! [`MessageView::field`] so call sites never branch on the shape themselves.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Case-insensitive prefixes that mark string tool output as a failure.
pub const TOOL_ERROR_PREFIXES: [&str; 4] = ["error:", "failed:", "exception:", "traceback"];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum MessageKind {
    Ai,
    AiChunk,
    Human,
    Tool,
    Other,
}

impl MessageKind {
    fn from_type_name(raw: &str) -> Self {
        match raw {
            "ai" | "AIMessage" => MessageKind::Ai,
            "AIMessageChunk" => MessageKind::AiChunk,
            "human" | "HumanMessage" => MessageKind::Human,
            "tool" | "ToolMessage" => MessageKind::Tool,
            _ => MessageKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MessageView<'a> {
    pub(crate) kind: MessageKind,
    fields: &'a Map<String, Value>,
}

/// A complete tool call request embedded in an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolCallRequest {
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) args: Value,
}

/// One incremental tool-call fragment from a token-level chunk.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolCallFragment {
    pub(crate) index: Option<u64>,
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) args: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct TokenUsage {
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) total_tokens: u64,
}

pub(crate) fn message_view(value: &Value) -> Option<MessageView<'_>> {
    let obj = value.as_object()?;
    let type_name = obj.get("type").and_then(Value::as_str)?;

    if type_name == "constructor" {
        let class = obj
            .get("id")
            .and_then(Value::as_array)
            .and_then(|path| path.last())
            .and_then(Value::as_str)?;
        let fields = obj.get("kwargs").and_then(Value::as_object)?;
        return Some(MessageView {
            kind: MessageKind::from_type_name(class),
            fields,
        });
    }

    let fields = match obj.get("data").and_then(Value::as_object) {
        Some(data) if !obj.contains_key("content") => data,
        _ => obj,
    };
    Some(MessageView {
        kind: MessageKind::from_type_name(type_name),
        fields,
    })
}

impl<'a> MessageView<'a> {
    /// Field lookup with `null` treated as absent.
    pub(crate) fn field(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    pub(crate) fn str_field(&self, name: &str) -> Option<&'a str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Message text: string content as-is, content blocks joined by a space.
    pub(crate) fn text(&self) -> String {
        match self.field("content") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(blocks)) => blocks
                .iter()
                .filter_map(|block| match block {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(map) => map.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub(crate) fn tool_calls(&self) -> Vec<ToolCallRequest> {
        let Some(calls) = self.field("tool_calls").and_then(Value::as_array) else {
            return Vec::new();
        };
        calls
            .iter()
            .filter_map(Value::as_object)
            .map(|call| ToolCallRequest {
                id: non_null_str(call, "id"),
                name: non_null_str(call, "name"),
                args: call
                    .get("args")
                    .filter(|args| !args.is_null())
                    .cloned()
                    .unwrap_or_else(empty_object),
            })
            .collect()
    }

    pub(crate) fn tool_call_fragments(&self) -> Vec<ToolCallFragment> {
        let Some(chunks) = self.field("tool_call_chunks").and_then(Value::as_array) else {
            return Vec::new();
        };
        chunks
            .iter()
            .filter_map(Value::as_object)
            .map(|chunk| ToolCallFragment {
                index: chunk.get("index").and_then(Value::as_u64),
                id: non_null_str(chunk, "id"),
                name: non_null_str(chunk, "name"),
                args: non_null_str(chunk, "args"),
            })
            .collect()
    }

    /// Returns `Some(error_message)` when a tool result represents a failure.
    ///
    /// Checked in order: explicit `status`, an `error` marker in structured
    /// content, then a case-insensitive prefix match on string content.
    pub(crate) fn tool_error(&self) -> Option<String> {
        let content = self.field("content");

        if self.str_field("status") == Some("error") {
            let message = match content {
                Some(Value::String(text)) if !text.is_empty() => text.clone(),
                Some(Value::String(_)) | None => "Unknown error".to_string(),
                Some(other) => other.to_string(),
            };
            return Some(message);
        }

        match content {
            Some(Value::Object(map)) => map
                .get("error")
                .filter(|marker| is_truthy(marker))
                .map(|marker| match marker {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                }),
            Some(Value::String(text)) => {
                let lowered = text.trim().to_lowercase();
                TOOL_ERROR_PREFIXES
                    .iter()
                    .any(|prefix| lowered.starts_with(prefix))
                    .then(|| text.clone())
            }
            _ => None,
        }
    }

    pub(crate) fn usage(&self) -> Option<TokenUsage> {
        let usage = self.field("usage_metadata")?.as_object()?;
        let input_tokens = usage.get("input_tokens").and_then(Value::as_u64).unwrap_or(0);
        let output_tokens = usage.get("output_tokens").and_then(Value::as_u64).unwrap_or(0);
        let total_tokens = usage
            .get("total_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| input_tokens.saturating_add(output_tokens));
        (total_tokens > 0).then_some(TokenUsage {
            input_tokens,
            output_tokens,
            total_tokens,
        })
    }
}

/// Strips stringified tool-use dictionaries some providers leak into text.
/// Surrounding whitespace is left alone.
pub(crate) fn clean_tool_dict_from_content(content: &str) -> String {
    static TOOL_DICT: OnceLock<Regex> = OnceLock::new();
    let pattern = TOOL_DICT.get_or_init(|| {
        Regex::new(
            r"(?s)\{'id':\s*'[^']+',\s*'input':\s*\{.*?\},\s*'name':\s*'[^']+',\s*'type':\s*'tool_use'\}",
        )
        .expect("tool dict pattern is valid")
    });
    pattern.replace_all(content, "").into_owned()
}

pub(crate) fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn non_null_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
