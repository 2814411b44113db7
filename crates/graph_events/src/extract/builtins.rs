use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::pyliteral::parse_literal;
use super::ToolExtractor;
use crate::error::ExtractError;

/// Pulls the reflection text out of `think_tool` results.
///
/// Accepts plain text, a JSON string with a `reflection` field, or an object
/// with a `reflection` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectionExtractor;

impl ToolExtractor for ReflectionExtractor {
    fn tool_name(&self) -> &str {
        "think_tool"
    }

    fn extracted_type(&self) -> &str {
        "reflection"
    }

    fn extract(&self, content: &Value) -> Result<Option<Value>, ExtractError> {
        let found = match content {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => map.get("reflection").cloned(),
                _ if text.trim().is_empty() => None,
                _ => Some(Value::String(text.clone())),
            },
            Value::Object(map) => map.get("reflection").cloned(),
            _ => None,
        };
        Ok(found.filter(|value| !value.is_null()))
    }
}

/// Pulls the todo list out of `write_todos` results.
///
/// String content is tried as an embedded literal collection first (for
/// example `Updated todo list to [...]`, Python or JSON syntax), then as a
/// JSON document (`[...]` or `{"todos": ...}`). Structured content is read
/// directly. Only a list counts as a result.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoExtractor;

impl ToolExtractor for TodoExtractor {
    fn tool_name(&self) -> &str {
        "write_todos"
    }

    fn extracted_type(&self) -> &str {
        "todos"
    }

    fn extract(&self, content: &Value) -> Result<Option<Value>, ExtractError> {
        let todos = match content {
            Value::String(text) => todos_from_text(text),
            Value::Object(map) => map.get("todos").cloned().map(|todos| match todos {
                Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
                other => other,
            }),
            Value::Array(_) => Some(content.clone()),
            _ => None,
        };
        Ok(todos.filter(Value::is_array))
    }
}

fn todos_from_text(text: &str) -> Option<Value> {
    static EMBEDDED_LIST: OnceLock<Regex> = OnceLock::new();
    let pattern =
        EMBEDDED_LIST.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("list pattern is valid"));

    let embedded = pattern.find(text).and_then(|found| {
        let literal = found.as_str();
        parse_literal(literal)
            .ok()
            .or_else(|| serde_json::from_str(literal).ok())
    });
    if embedded.is_some() {
        return embedded;
    }

    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => match map.get("todos")? {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => Some(other.clone()),
        },
        list @ Value::Array(_) => Some(list),
        _ => None,
    }
}
