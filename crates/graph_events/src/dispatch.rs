//! Stream shape classification and per-item routing.
//!
//! The shape is fixed once per stream: from configuration, or in automatic
//! mode from the first item. Every later item must match it.

use serde_json::Value;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::channels::{FragmentBuffer, MessageProcessor, ParserState, UpdateProcessor};
use crate::config::StreamMode;
use crate::dedup::DedupPolicy;
use crate::events::StreamEvent;
use crate::shape::message_view;

/// A stream shape with automatic detection already settled.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum ResolvedMode {
    /// Items are bare payloads of this channel.
    Single(Channel),
    /// Items are `[channel_name, payload]` pairs for these channels.
    Multi(Vec<Channel>),
}

impl ResolvedMode {
    /// `None` when the mode must be detected from the stream.
    pub(crate) fn from_config(mode: &StreamMode) -> Option<Self> {
        match mode {
            StreamMode::Single(channel) => Some(ResolvedMode::Single(*channel)),
            StreamMode::Multi(channels) => Some(ResolvedMode::Multi(channels.clone())),
            StreamMode::Auto => None,
        }
    }

    fn policy(&self) -> DedupPolicy {
        match self {
            ResolvedMode::Single(channel) => DedupPolicy::for_channels(&[*channel]),
            ResolvedMode::Multi(channels) => DedupPolicy::for_channels(channels),
        }
    }
}

/// Classifies the first item of an automatically detected stream.
pub(crate) fn detect_mode(first: &Value) -> ResolvedMode {
    if tagged_parts(first).is_some() {
        return ResolvedMode::Multi(Channel::ALL.to_vec());
    }
    match first.as_array().map(Vec::as_slice) {
        Some([message, _metadata]) if message_view(message).is_some() => {
            ResolvedMode::Single(Channel::Messages)
        }
        _ => ResolvedMode::Single(Channel::Updates),
    }
}

/// Splits a `[channel_name, payload]` pair.
fn tagged_parts(item: &Value) -> Option<(&str, &Value)> {
    match item.as_array().map(Vec::as_slice) {
        Some([Value::String(tag), payload]) => Some((tag.as_str(), payload)),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct Dispatcher {
    mode: Option<ResolvedMode>,
    policy: Option<DedupPolicy>,
    fragments: FragmentBuffer,
}

impl Dispatcher {
    pub(crate) fn new(mode: &StreamMode) -> Self {
        let mode = ResolvedMode::from_config(mode);
        Self {
            policy: mode.as_ref().map(ResolvedMode::policy),
            mode,
            fragments: FragmentBuffer::default(),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.mode.is_some()
    }

    pub(crate) fn feed(&mut self, state: &mut ParserState<'_>, item: &Value, out: &mut Vec<StreamEvent>) {
        let mode = match &self.mode {
            Some(mode) => mode.clone(),
            None => {
                let detected = detect_mode(item);
                debug!(mode = ?detected, "detected stream mode from first item");
                self.policy = Some(detected.policy());
                self.mode = Some(detected.clone());
                detected
            }
        };

        match mode {
            ResolvedMode::Single(channel) => {
                if tagged_parts(item).is_some() {
                    warn!(%channel, "channel-tagged item in a single-channel stream; skipping");
                    return;
                }
                self.route(state, channel, item, out);
            }
            ResolvedMode::Multi(channels) => {
                let Some((tag, payload)) = tagged_parts(item) else {
                    warn!("untagged item in a multi-channel stream; skipping");
                    return;
                };
                match Channel::from_tag(tag) {
                    Some(channel) if channels.contains(&channel) => {
                        self.route(state, channel, payload, out);
                    }
                    _ => debug!(channel = tag, "dropping item from unhandled channel"),
                }
            }
        }
    }

    /// Flushes buffered tool-call fragments and appends the terminal event.
    pub(crate) fn finish(&mut self, state: &mut ParserState<'_>, out: &mut Vec<StreamEvent>) {
        if let Some(policy) = self.policy {
            let assemble = policy.assemble_message_tool_calls();
            MessageProcessor::new(state, &mut self.fragments, assemble).flush(out);
        }
        self.fragments.clear();
        out.push(StreamEvent::Complete);
    }

    pub(crate) fn clear(&mut self) {
        self.fragments.clear();
    }

    fn route(
        &mut self,
        state: &mut ParserState<'_>,
        channel: Channel,
        payload: &Value,
        out: &mut Vec<StreamEvent>,
    ) {
        let policy = self.policy.unwrap_or_else(|| DedupPolicy::for_channels(&[channel]));
        let mut produced = Vec::new();
        match channel {
            Channel::Updates => {
                UpdateProcessor::new(state, policy.suppress_update_content())
                    .process(payload, &mut produced);
            }
            Channel::Messages => {
                MessageProcessor::new(state, &mut self.fragments, policy.assemble_message_tool_calls())
                    .process(payload, &mut produced);
            }
        }
        out.extend(
            produced
                .into_iter()
                .filter(|event| policy.allows(channel, event)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_tagged_pairs_as_multi_channel() {
        let item = json!(["updates", {"agent": {"messages": []}}]);
        assert_eq!(
            detect_mode(&item),
            ResolvedMode::Multi(vec![Channel::Updates, Channel::Messages])
        );
    }

    #[test]
    fn detects_message_pairs_as_messages_only() {
        let item = json!([{"type": "AIMessageChunk", "content": "Hi"}, {"langgraph_node": "agent"}]);
        assert_eq!(detect_mode(&item), ResolvedMode::Single(Channel::Messages));
    }

    #[test]
    fn everything_else_is_updates() {
        assert_eq!(
            detect_mode(&json!({"agent": {"messages": []}})),
            ResolvedMode::Single(Channel::Updates)
        );
        assert_eq!(
            detect_mode(&json!([1, 2, 3])),
            ResolvedMode::Single(Channel::Updates)
        );
    }

    #[test]
    fn explicit_modes_skip_detection() {
        assert!(Dispatcher::new(&StreamMode::dual()).is_resolved());
        assert!(Dispatcher::new(&StreamMode::messages()).is_resolved());
        assert!(!Dispatcher::new(&StreamMode::Auto).is_resolved());
    }
}
