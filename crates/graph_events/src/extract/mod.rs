//! Pluggable extraction of structured data from tool results.
//!
//! An extractor is keyed by tool name. When a tool result for that name
//! arrives on the update channel, the extractor sees the result payload and
//! may return data, which is emitted as `StreamEvent::ToolExtracted`.

mod builtins;
mod pyliteral;

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::error::ExtractError;

pub use builtins::{ReflectionExtractor, TodoExtractor};

pub trait ToolExtractor: Send + Sync {
    /// Tool whose results this extractor handles.
    fn tool_name(&self) -> &str;

    /// Tag describing the extracted data (for example `"todos"`).
    fn extracted_type(&self) -> &str;

    /// Returns `Ok(None)` when the content carries nothing to extract.
    fn extract(&self, content: &Value) -> Result<Option<Value>, ExtractError>;
}

/// Closure-backed extractor, see [`extractor_fn`].
pub struct FnExtractor<F> {
    tool_name: String,
    extracted_type: String,
    extract: F,
}

impl<F> ToolExtractor for FnExtractor<F>
where
    F: Fn(&Value) -> Result<Option<Value>, ExtractError> + Send + Sync,
{
    fn tool_name(&self) -> &str {
        &self.tool_name
    }

    fn extracted_type(&self) -> &str {
        &self.extracted_type
    }

    fn extract(&self, content: &Value) -> Result<Option<Value>, ExtractError> {
        (self.extract)(content)
    }
}

pub fn extractor_fn<F>(
    tool_name: impl Into<String>,
    extracted_type: impl Into<String>,
    extract: F,
) -> FnExtractor<F>
where
    F: Fn(&Value) -> Result<Option<Value>, ExtractError> + Send + Sync,
{
    FnExtractor {
        tool_name: tool_name.into(),
        extracted_type: extracted_type.into(),
        extract,
    }
}

/// Data produced by a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub extracted_type: String,
    pub data: Value,
}

/// Extractors by tool name. Scoped to one parser; registration is
/// last-write-wins per tool name.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn ToolExtractor>>,
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.extractors.keys().collect();
        names.sort();
        f.debug_struct("ExtractorRegistry")
            .field("tools", &names)
            .finish()
    }
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the reflection and todo-list extractors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ReflectionExtractor);
        registry.register(TodoExtractor);
        registry
    }

    /// Registers `extractor`, returning the one it replaced, if any.
    pub fn register<E>(&mut self, extractor: E) -> Option<Box<dyn ToolExtractor>>
    where
        E: ToolExtractor + 'static,
    {
        self.register_boxed(Box::new(extractor))
    }

    pub fn register_boxed(
        &mut self,
        extractor: Box<dyn ToolExtractor>,
    ) -> Option<Box<dyn ToolExtractor>> {
        let name = extractor.tool_name().to_string();
        self.extractors.insert(name, extractor)
    }

    pub fn unregister(&mut self, tool_name: &str) -> Option<Box<dyn ToolExtractor>> {
        self.extractors.remove(tool_name)
    }

    pub fn get(&self, tool_name: &str) -> Option<&dyn ToolExtractor> {
        self.extractors.get(tool_name).map(Box::as_ref)
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.extractors.contains_key(tool_name)
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Runs the extractor registered for `tool_name`, if any.
    ///
    /// Extractor failures are logged and treated as "no data".
    pub fn run(&self, tool_name: &str, content: &Value) -> Option<Extracted> {
        let extractor = self.get(tool_name)?;
        match extractor.extract(content) {
            Ok(Some(data)) => Some(Extracted {
                extracted_type: extractor.extracted_type().to_string(),
                data,
            }),
            Ok(None) => None,
            Err(err) => {
                debug!(tool = tool_name, error = %err, "tool extractor failed; skipping");
                None
            }
        }
    }
}
