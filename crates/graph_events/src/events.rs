use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Assistant,
    Human,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Success,
    Error,
}

/// One tool invocation awaiting a human decision, as carried by an interrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub tool: Option<String>,
    pub tool_call_id: String,
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub allowed_decisions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptEvent {
    pub action_requests: Vec<ActionRequest>,
    pub review_configs: Vec<ReviewConfig>,
    /// The interrupt payload exactly as received.
    pub raw_value: Value,
}

impl InterruptEvent {
    pub fn needs_approval(&self) -> bool {
        !self.action_requests.is_empty()
    }
}

/// Normalized stream event.
///
/// Every drained stream ends with exactly one [`StreamEvent::Complete`], or with a
/// single [`StreamEvent::Error`] when the upstream source fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Content {
        content: String,
        #[serde(default)]
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
    },
    ToolCallStart {
        id: String,
        name: String,
        args: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
    },
    ToolCallEnd {
        id: String,
        name: String,
        result: Value,
        status: ToolOutcome,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<f64>,
    },
    ToolExtracted {
        tool_name: String,
        extracted_type: String,
        data: Value,
    },
    Interrupt(InterruptEvent),
    StateUpdate {
        node: String,
        key: String,
        value: Value,
    },
    Usage {
        input_tokens: u64,
        output_tokens: u64,
        total_tokens: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
    },
    Complete,
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fault: Option<String>,
    },
}

impl StreamEvent {
    pub fn content(content: impl Into<String>, role: Role, node: Option<&str>) -> Self {
        StreamEvent::Content {
            content: content.into(),
            role,
            node: node.map(str::to_string),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Content { .. } => "content",
            StreamEvent::ToolCallStart { .. } => "tool_call_start",
            StreamEvent::ToolCallEnd { .. } => "tool_call_end",
            StreamEvent::ToolExtracted { .. } => "tool_extracted",
            StreamEvent::Interrupt(_) => "interrupt",
            StreamEvent::StateUpdate { .. } => "state_update",
            StreamEvent::Usage { .. } => "usage",
            StreamEvent::Complete => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// True for the events that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete | StreamEvent::Error { .. })
    }
}
