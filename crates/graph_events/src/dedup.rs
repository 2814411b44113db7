//! Cross-channel precedence when more than one channel is active.
//!
//! | Event         | updates    | messages                    |
//! |---------------|------------|-----------------------------|
//! | Content       | suppressed | emits                       |
//! | ToolCallStart | emits      | suppressed (no accumulation)|
//! | everything else | emits    | never produced              |
//!
//! With a single active channel nothing is suppressed.

use crate::channel::Channel;
use crate::events::StreamEvent;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DedupPolicy {
    updates: bool,
    messages: bool,
}

impl DedupPolicy {
    pub fn for_channels(channels: &[Channel]) -> Self {
        Self {
            updates: channels.contains(&Channel::Updates),
            messages: channels.contains(&Channel::Messages),
        }
    }

    pub fn is_dual(&self) -> bool {
        self.updates && self.messages
    }

    /// The update channel withholds Content; the message channel streams it.
    pub fn suppress_update_content(&self) -> bool {
        self.is_dual()
    }

    /// The message channel is the only source of tool calls and must
    /// assemble them from fragments.
    pub fn assemble_message_tool_calls(&self) -> bool {
        self.messages && !self.updates
    }

    /// Whether `event` produced by `source` survives deduplication.
    pub fn allows(&self, source: Channel, event: &StreamEvent) -> bool {
        if !self.is_dual() {
            return true;
        }
        match (source, event) {
            (Channel::Updates, StreamEvent::Content { .. }) => false,
            (Channel::Messages, StreamEvent::Content { .. }) => true,
            (Channel::Messages, _) => false,
            (Channel::Updates, _) => true,
        }
    }
}
