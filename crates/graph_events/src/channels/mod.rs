//! Per-channel processors: one raw payload in, zero or more events out.

mod messages;
mod updates;

pub(crate) use messages::{FragmentBuffer, MessageProcessor};
pub(crate) use updates::UpdateProcessor;

use crate::config::ParserConfig;
use crate::extract::ExtractorRegistry;
use crate::tracker::ToolCallTracker;

/// Parser-instance state the processors read and mutate.
pub(crate) struct ParserState<'a> {
    pub(crate) config: &'a ParserConfig,
    pub(crate) tracker: &'a mut ToolCallTracker,
    pub(crate) extractors: &'a ExtractorRegistry,
}
