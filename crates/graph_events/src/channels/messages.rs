use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use super::ParserState;
use crate::events::{Role, StreamEvent};
use crate::shape::{
    clean_tool_dict_from_content, empty_object, message_view, MessageKind, ToolCallFragment,
};

const NODE_METADATA_KEY: &str = "langgraph_node";

/// A tool call being assembled from fragments sharing one fragment index.
#[derive(Debug, Clone, Default, PartialEq)]
struct PartialToolCall {
    id: Option<String>,
    name: Option<String>,
    args: String,
    node: Option<String>,
    emitted: bool,
}

impl PartialToolCall {
    fn absorb(&mut self, fragment: &ToolCallFragment, node: Option<&str>) {
        if self.id.is_none() {
            self.id = fragment.id.clone();
        }
        if self.name.is_none() {
            self.name = fragment.name.clone().filter(|name| !name.is_empty());
        }
        if let Some(args) = &fragment.args {
            self.args.push_str(args);
        }
        if self.node.is_none() {
            self.node = node.map(str::to_string);
        }
    }

    /// Arguments once they form a complete JSON object.
    fn complete_args(&self) -> Option<Value> {
        self.id.as_ref()?;
        self.name.as_ref()?;
        serde_json::from_str::<Value>(&self.args)
            .ok()
            .filter(Value::is_object)
    }

    /// Best-effort arguments for a call that never completed.
    fn flushed_args(&self) -> Value {
        if self.args.trim().is_empty() {
            return empty_object();
        }
        Value::String(self.args.clone())
    }
}

/// Index-keyed buffer of in-flight tool-call fragments.
#[derive(Debug, Clone, Default)]
pub(crate) struct FragmentBuffer {
    calls: BTreeMap<u64, PartialToolCall>,
}

impl FragmentBuffer {
    fn absorb(&mut self, index: u64, fragment: &ToolCallFragment, node: Option<&str>) {
        let slot = self.calls.entry(index).or_default();
        // A new id at an occupied index starts a different call.
        if let (Some(new_id), Some(old_id)) = (&fragment.id, &slot.id) {
            if new_id != old_id {
                *slot = PartialToolCall::default();
            }
        }
        slot.absorb(fragment, node);
    }

    pub(crate) fn clear(&mut self) {
        self.calls.clear();
    }
}

/// Turns one `(token_chunk, metadata)` pair into events.
pub(crate) struct MessageProcessor<'s, 'a> {
    state: &'s mut ParserState<'a>,
    buffer: &'s mut FragmentBuffer,
    assemble_tool_calls: bool,
}

impl<'s, 'a> MessageProcessor<'s, 'a> {
    pub(crate) fn new(
        state: &'s mut ParserState<'a>,
        buffer: &'s mut FragmentBuffer,
        assemble_tool_calls: bool,
    ) -> Self {
        Self {
            state,
            buffer,
            assemble_tool_calls,
        }
    }

    pub(crate) fn process(&mut self, payload: &Value, out: &mut Vec<StreamEvent>) {
        let (message, metadata) = match payload.as_array().map(Vec::as_slice) {
            Some([message, metadata]) => (message, Some(metadata)),
            _ => (payload, None),
        };
        let node = metadata
            .and_then(|metadata| metadata.get(NODE_METADATA_KEY))
            .and_then(Value::as_str);

        let Some(view) = message_view(message) else {
            debug!("message payload is not a recognizable message; ignoring");
            return;
        };
        if view.kind != MessageKind::AiChunk {
            return;
        }

        let fragments = view.tool_call_fragments();
        let mut text = view.text();
        if !fragments.is_empty() {
            text = clean_tool_dict_from_content(&text);
        }
        if !text.is_empty() {
            out.push(StreamEvent::content(text, Role::Assistant, node));
        }

        if !self.assemble_tool_calls || fragments.is_empty() {
            return;
        }
        for (position, fragment) in fragments.iter().enumerate() {
            let index = fragment.index.unwrap_or(position as u64);
            self.buffer.absorb(index, fragment, node);
        }
        self.emit_completed(out);
    }

    /// Emits calls whose arguments have become a complete JSON object.
    fn emit_completed(&mut self, out: &mut Vec<StreamEvent>) {
        let ready: Vec<(u64, Value)> = self
            .buffer
            .calls
            .iter()
            .filter(|(_, call)| !call.emitted)
            .filter_map(|(index, call)| call.complete_args().map(|args| (*index, args)))
            .collect();
        for (index, args) in ready {
            self.emit(index, args, out);
        }
    }

    /// Emits every call that has an id and a name but never completed.
    pub(crate) fn flush(&mut self, out: &mut Vec<StreamEvent>) {
        if !self.assemble_tool_calls {
            return;
        }
        let pending: Vec<(u64, Value)> = self
            .buffer
            .calls
            .iter()
            .filter(|(_, call)| !call.emitted && call.id.is_some() && call.name.is_some())
            .map(|(index, call)| (*index, call.flushed_args()))
            .collect();
        for (index, args) in pending {
            self.emit(index, args, out);
        }
        self.buffer.clear();
    }

    fn emit(&mut self, index: u64, args: Value, out: &mut Vec<StreamEvent>) {
        let Some(call) = self.buffer.calls.get_mut(&index) else {
            return;
        };
        call.emitted = true;
        let (Some(id), Some(name)) = (call.id.clone(), call.name.clone()) else {
            return;
        };
        let config = self.state.config;
        if !config.track_tool_lifecycle || config.skips(&name) {
            return;
        }
        if self.state.tracker.start(&id, &name, &args, call.node.as_deref()) {
            out.push(StreamEvent::ToolCallStart {
                id,
                name,
                args,
                node: call.node.clone(),
            });
        }
    }
}
