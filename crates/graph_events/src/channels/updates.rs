use serde_json::{Map, Value};
use tracing::debug;

use super::ParserState;
use crate::events::{Role, StreamEvent, ToolOutcome};
use crate::interrupt::{canonicalize_interrupt, INTERRUPT_KEY};
use crate::shape::{clean_tool_dict_from_content, message_view, MessageKind, MessageView};

const MESSAGES_KEY: &str = "messages";

/// Turns one node-level state diff (`{node: {key: value}}`) into events.
pub(crate) struct UpdateProcessor<'s, 'a> {
    state: &'s mut ParserState<'a>,
    suppress_content: bool,
}

impl<'s, 'a> UpdateProcessor<'s, 'a> {
    pub(crate) fn new(state: &'s mut ParserState<'a>, suppress_content: bool) -> Self {
        Self {
            state,
            suppress_content,
        }
    }

    pub(crate) fn process(&mut self, diff: &Value, out: &mut Vec<StreamEvent>) {
        let Some(nodes) = diff.as_object() else {
            debug!("update payload is not an object; ignoring");
            return;
        };

        // An interrupt diff carries nothing else of interest.
        if let Some(raw) = nodes.get(INTERRUPT_KEY) {
            out.push(StreamEvent::Interrupt(canonicalize_interrupt(raw)));
            return;
        }

        for (node, node_state) in nodes {
            let Some(node_state) = node_state.as_object() else {
                continue;
            };
            self.process_node(node, node_state, out);
        }
    }

    fn process_node(&mut self, node: &str, node_state: &Map<String, Value>, out: &mut Vec<StreamEvent>) {
        if let Some(message) = node_state.get(MESSAGES_KEY).and_then(latest_message) {
            self.process_message(node, message, out);
        }

        if self.state.config.include_state_updates {
            for (key, value) in node_state {
                if key == MESSAGES_KEY {
                    continue;
                }
                out.push(StreamEvent::StateUpdate {
                    node: node.to_string(),
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    fn process_message(&mut self, node: &str, message: &Value, out: &mut Vec<StreamEvent>) {
        let Some(view) = message_view(message) else {
            debug!(node, "unrecognized message shape in update; ignoring");
            return;
        };
        match view.kind {
            MessageKind::Tool => self.process_tool_result(&view, out),
            MessageKind::Ai | MessageKind::AiChunk => self.process_assistant(node, &view, out),
            MessageKind::Human => {
                if !self.suppress_content {
                    push_content(out, view.text().trim(), Role::Human, node);
                }
            }
            MessageKind::Other => {}
        }
    }

    fn process_assistant(&mut self, node: &str, view: &MessageView<'_>, out: &mut Vec<StreamEvent>) {
        let tool_calls = view.tool_calls();

        if self.state.config.track_tool_lifecycle {
            for (index, call) in tool_calls.iter().enumerate() {
                let Some(name) = call.name.as_deref() else {
                    continue;
                };
                if self.state.config.skips(name) {
                    continue;
                }
                let id = call
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("call_{index}"));
                if self.state.tracker.start(&id, name, &call.args, Some(node)) {
                    out.push(StreamEvent::ToolCallStart {
                        id,
                        name: name.to_string(),
                        args: call.args.clone(),
                        node: Some(node.to_string()),
                    });
                }
            }
        }

        if !self.suppress_content {
            let text = view.text();
            let mut text = text.trim().to_string();
            if !text.is_empty() && !tool_calls.is_empty() {
                text = clean_tool_dict_from_content(&text).trim().to_string();
            }
            push_content(out, &text, Role::Assistant, node);
        }

        if let Some(usage) = view.usage() {
            out.push(StreamEvent::Usage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                total_tokens: usage.total_tokens,
                node: Some(node.to_string()),
            });
        }
    }

    fn process_tool_result(&mut self, view: &MessageView<'_>, out: &mut Vec<StreamEvent>) {
        let name = view.str_field("name");
        if name.is_some_and(|name| self.state.config.skips(name)) {
            return;
        }

        let content = view.field("content").cloned().unwrap_or(Value::Null);
        let error_message = view.tool_error();
        let outcome = if error_message.is_some() {
            ToolOutcome::Error
        } else {
            ToolOutcome::Success
        };

        if self.state.config.track_tool_lifecycle {
            if let Some(id) = view.str_field("tool_call_id") {
                let name = name.unwrap_or("unknown");
                let resolution = self.state.tracker.resolve(id, name, &content, outcome);
                if resolution.is_new() {
                    out.push(StreamEvent::ToolCallEnd {
                        id: id.to_string(),
                        name: name.to_string(),
                        result: content.clone(),
                        status: outcome,
                        error_message,
                        duration_ms: resolution.duration_ms(),
                    });
                }
            }
        }

        if let Some(name) = name {
            let input = view.field("artifact").unwrap_or(&content);
            if let Some(extracted) = self.state.extractors.run(name, input) {
                out.push(StreamEvent::ToolExtracted {
                    tool_name: name.to_string(),
                    extracted_type: extracted.extracted_type,
                    data: extracted.data,
                });
            }
        }
    }
}

/// The update channel surfaces one new message per node per tick: the last one.
fn latest_message(messages: &Value) -> Option<&Value> {
    match messages {
        Value::Array(items) => items.last(),
        Value::Null => None,
        single => Some(single),
    }
}

fn push_content(out: &mut Vec<StreamEvent>, text: &str, role: Role, node: &str) {
    if !text.is_empty() {
        out.push(StreamEvent::content(text, role, Some(node)));
    }
}
