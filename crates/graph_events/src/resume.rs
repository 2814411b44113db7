//! Inputs for resuming the upstream runtime after an interrupt.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// What the human decided for one action request.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum DecisionKind {
    Approve,
    Reject,
    Edit,
    /// A decision type this crate has no dedicated variant for.
    Other(String),
}

impl DecisionKind {
    pub fn as_str(&self) -> &str {
        match self {
            DecisionKind::Approve => "approve",
            DecisionKind::Reject => "reject",
            DecisionKind::Edit => "edit",
            DecisionKind::Other(other) => other,
        }
    }
}

impl From<&str> for DecisionKind {
    fn from(raw: &str) -> Self {
        match raw {
            "approve" => DecisionKind::Approve,
            "reject" => DecisionKind::Reject,
            "edit" => DecisionKind::Edit,
            other => DecisionKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DecisionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DecisionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DecisionKind::from(raw.as_str()))
    }
}

/// One decision record, serialized as `{"type": kind, "args"?, "message"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "type")]
    pub kind: DecisionKind,
    #[serde(rename = "args", default, skip_serializing_if = "Option::is_none")]
    pub edited_args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Decision {
    pub fn approve() -> Self {
        Self::of_kind(DecisionKind::Approve)
    }

    pub fn reject(message: Option<String>) -> Self {
        Self {
            message,
            ..Self::of_kind(DecisionKind::Reject)
        }
    }

    /// Approves the call with replacement arguments.
    pub fn edit(args: Value) -> Self {
        Self {
            edited_args: Some(args),
            ..Self::of_kind(DecisionKind::Edit)
        }
    }

    pub fn of_kind(kind: impl Into<DecisionKind>) -> Self {
        Self {
            kind: kind.into(),
            edited_args: None,
            message: None,
        }
    }
}

/// The resume payload the runtime's resume API expects: `{"resume": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeCommand {
    pub resume: Value,
}

impl ResumeCommand {
    /// Resumes a simple interrupt (for example a yes/no confirmation) with `value`.
    pub fn from_value(value: Value) -> Self {
        Self { resume: value }
    }

    pub fn to_value(&self) -> Value {
        json!({ "resume": self.resume })
    }
}

/// Builds the resume command for an ordered list of decisions, one per
/// action request of the interrupt being answered.
pub fn create_resume_input(decisions: &[Decision]) -> ResumeCommand {
    ResumeCommand {
        resume: json!({ "decisions": decisions }),
    }
}

/// Everything that can start or continue an agent run.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInput {
    /// A plain user message.
    Message(String),
    /// Answers to a pending interrupt.
    Decisions(Vec<Decision>),
    /// A custom input, passed through untouched.
    Raw(Value),
}

pub fn prepare_agent_input(input: AgentInput) -> Value {
    match input {
        AgentInput::Message(text) => json!({
            "messages": [{"role": "user", "content": text}]
        }),
        AgentInput::Decisions(decisions) => create_resume_input(&decisions).to_value(),
        AgentInput::Raw(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_wrap_in_resume_payload() {
        let command = create_resume_input(&[
            Decision::approve(),
            Decision::reject(Some("too risky".to_string())),
            Decision::edit(json!({"command": "ls -la"})),
        ]);
        assert_eq!(
            command.to_value(),
            json!({"resume": {"decisions": [
                {"type": "approve"},
                {"type": "reject", "message": "too risky"},
                {"type": "edit", "args": {"command": "ls -la"}}
            ]}})
        );
    }

    #[test]
    fn decision_serde_matches_resume_shape() {
        let decision = Decision::of_kind("respond");
        assert_eq!(decision.kind, DecisionKind::Other("respond".to_string()));
        assert_eq!(serde_json::to_value(&decision).unwrap(), json!({"type": "respond"}));

        let parsed: Decision =
            serde_json::from_value(json!({"type": "edit", "args": {"x": 1}})).unwrap();
        assert_eq!(parsed, Decision::edit(json!({"x": 1})));
    }

    #[test]
    fn simple_value_resume() {
        assert_eq!(
            ResumeCommand::from_value(json!(true)).to_value(),
            json!({"resume": true})
        );
    }

    #[test]
    fn agent_inputs() {
        assert_eq!(
            prepare_agent_input(AgentInput::Message("Hello!".to_string())),
            json!({"messages": [{"role": "user", "content": "Hello!"}]})
        );
        assert_eq!(
            prepare_agent_input(AgentInput::Decisions(vec![Decision::approve()])),
            json!({"resume": {"decisions": [{"type": "approve"}]}})
        );
        assert_eq!(
            prepare_agent_input(AgentInput::Raw(json!({"custom": "data"}))),
            json!({"custom": "data"})
        );
    }
}
