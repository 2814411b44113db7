use std::collections::{BTreeSet, VecDeque};
use std::convert::Infallible;
use std::fmt::Display;

use serde_json::Value;
use tracing::warn;

use crate::channels::ParserState;
use crate::config::{ParserConfig, StreamMode};
use crate::dispatch::Dispatcher;
use crate::error::ParserError;
use crate::events::StreamEvent;
use crate::extract::{ExtractorRegistry, ToolExtractor};
use crate::tracker::ToolCallTracker;

/// Normalizes raw runtime chunks into [`StreamEvent`]s.
///
/// Lifecycle records and extractors belong to this instance. Parse one stream
/// at a time; use separate parsers for concurrent streams.
#[derive(Debug)]
pub struct StreamParser {
    config: ParserConfig,
    extractors: ExtractorRegistry,
    tracker: ToolCallTracker,
    chunks: Dispatcher,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl StreamParser {
    /// Parser with the built-in extractors registered.
    pub fn new(config: ParserConfig) -> Self {
        Self::with_extractors(config, ExtractorRegistry::with_builtins())
    }

    pub fn with_extractors(config: ParserConfig, extractors: ExtractorRegistry) -> Self {
        let chunks = Dispatcher::new(&config.stream_mode);
        Self {
            config,
            extractors,
            tracker: ToolCallTracker::new(),
            chunks,
        }
    }

    pub fn builder() -> StreamParserBuilder {
        StreamParserBuilder::default()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ToolCallTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ToolCallTracker {
        &mut self.tracker
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    /// Registers `extractor` for its tool name, replacing any previous one.
    pub fn register_extractor<E>(&mut self, extractor: E) -> Option<Box<dyn ToolExtractor>>
    where
        E: ToolExtractor + 'static,
    {
        self.extractors.register(extractor)
    }

    pub fn unregister_extractor(&mut self, tool_name: &str) -> Option<Box<dyn ToolExtractor>> {
        self.extractors.unregister(tool_name)
    }

    /// Forgets every recorded tool call and any buffered fragments.
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.chunks.clear();
    }

    /// Parses a fallible item source. An `Err` item ends the stream with a
    /// single [`StreamEvent::Error`]; otherwise the last event is
    /// [`StreamEvent::Complete`].
    pub fn parse<I, E>(&mut self, items: I) -> ParseEvents<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Result<Value, E>>,
        E: Display,
    {
        ParseEvents {
            pump: EventPump::new(self),
            items: items.into_iter(),
        }
    }

    /// [`StreamParser::parse`] for sources that cannot fail.
    pub fn parse_values<I>(&mut self, items: I) -> ParseEvents<'_, InfallibleItems<I::IntoIter>>
    where
        I: IntoIterator<Item = Value>,
    {
        let items = items
            .into_iter()
            .map(Ok::<Value, Infallible> as fn(Value) -> Result<Value, Infallible>);
        self.parse(items)
    }

    /// Parses an async item source, see [`StreamParser::parse`].
    ///
    /// The source must be `Unpin`; wrap others with `Box::pin`.
    #[cfg(feature = "async")]
    pub fn parse_stream<S, E>(&mut self, source: S) -> AsyncParseEvents<'_, S>
    where
        S: futures_core::Stream<Item = Result<Value, E>> + Unpin,
        E: Display,
    {
        AsyncParseEvents {
            pump: EventPump::new(self),
            source,
        }
    }

    /// Processes one item outside a stream. No terminal event is produced.
    ///
    /// Fragment buffers persist across calls until [`StreamParser::reset`].
    pub fn parse_chunk(&mut self, item: &Value) -> Result<Vec<StreamEvent>, ParserError> {
        if !self.chunks.is_resolved() {
            return Err(ParserError::ChunkInAutoMode);
        }
        let mut out = Vec::new();
        let mut state = ParserState {
            config: &self.config,
            tracker: &mut self.tracker,
            extractors: &self.extractors,
        };
        self.chunks.feed(&mut state, item, &mut out);
        Ok(out)
    }

    fn state(&mut self) -> ParserState<'_> {
        ParserState {
            config: &self.config,
            tracker: &mut self.tracker,
            extractors: &self.extractors,
        }
    }
}

pub type InfallibleItems<I> = std::iter::Map<I, fn(Value) -> Result<Value, Infallible>>;

/// Per-stream state shared by the blocking and the async iterators.
struct EventPump<'p> {
    parser: &'p mut StreamParser,
    dispatcher: Dispatcher,
    queue: VecDeque<StreamEvent>,
    done: bool,
}

impl<'p> EventPump<'p> {
    fn new(parser: &'p mut StreamParser) -> Self {
        let dispatcher = Dispatcher::new(&parser.config.stream_mode);
        Self {
            parser,
            dispatcher,
            queue: VecDeque::new(),
            done: false,
        }
    }

    fn feed(&mut self, item: &Value) {
        let mut out = Vec::new();
        let mut state = self.parser.state();
        self.dispatcher.feed(&mut state, item, &mut out);
        self.queue.extend(out);
    }

    fn finish(&mut self) {
        let mut out = Vec::new();
        let mut state = self.parser.state();
        self.dispatcher.finish(&mut state, &mut out);
        self.queue.extend(out);
        self.done = true;
    }

    fn fail(&mut self, fault: &dyn Display) {
        let fault = fault.to_string();
        warn!(%fault, "upstream chunk source failed; ending stream");
        self.queue.push_back(StreamEvent::Error {
            message: format!("upstream stream failed: {fault}"),
            fault: Some(fault),
        });
        self.done = true;
    }
}

/// Blocking event iterator returned by [`StreamParser::parse`].
pub struct ParseEvents<'p, I> {
    pump: EventPump<'p>,
    items: I,
}

impl<I, E> Iterator for ParseEvents<'_, I>
where
    I: Iterator<Item = Result<Value, E>>,
    E: Display,
{
    type Item = StreamEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pump.queue.pop_front() {
                return Some(event);
            }
            if self.pump.done {
                return None;
            }
            match self.items.next() {
                Some(Ok(item)) => self.pump.feed(&item),
                Some(Err(err)) => self.pump.fail(&err),
                None => self.pump.finish(),
            }
        }
    }
}

#[cfg(feature = "async")]
mod async_events {
    use std::fmt::Display;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures_core::Stream;
    use serde_json::Value;

    use super::EventPump;
    use crate::events::StreamEvent;

    /// Async event stream returned by [`super::StreamParser::parse_stream`].
    pub struct AsyncParseEvents<'p, S> {
        pub(super) pump: EventPump<'p>,
        pub(super) source: S,
    }

    impl<S, E> Stream for AsyncParseEvents<'_, S>
    where
        S: Stream<Item = Result<Value, E>> + Unpin,
        E: Display,
    {
        type Item = StreamEvent;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            let this = self.get_mut();

            loop {
                if let Some(event) = this.pump.queue.pop_front() {
                    return Poll::Ready(Some(event));
                }
                if this.pump.done {
                    return Poll::Ready(None);
                }
                match Pin::new(&mut this.source).poll_next(cx) {
                    Poll::Ready(Some(Ok(item))) => this.pump.feed(&item),
                    Poll::Ready(Some(Err(err))) => this.pump.fail(&err),
                    Poll::Ready(None) => this.pump.finish(),
                    Poll::Pending => return Poll::Pending,
                }
            }
        }
    }
}

#[cfg(feature = "async")]
pub use async_events::AsyncParseEvents;

/// Consuming builder for [`StreamParser`].
#[derive(Debug)]
pub struct StreamParserBuilder {
    config: ParserConfig,
    extractors: ExtractorRegistry,
}

impl Default for StreamParserBuilder {
    fn default() -> Self {
        Self {
            config: ParserConfig::default(),
            extractors: ExtractorRegistry::with_builtins(),
        }
    }
}

impl StreamParserBuilder {
    /// Replaces every setting with `config`; extractors are kept.
    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stream_mode(mut self, mode: StreamMode) -> Self {
        self.config.stream_mode = mode;
        self
    }

    pub fn track_tool_lifecycle(mut self, enabled: bool) -> Self {
        self.config.track_tool_lifecycle = enabled;
        self
    }

    pub fn skip_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.config.skip_tools.insert(tool_name.into());
        self
    }

    pub fn skip_tools<I, S>(mut self, tool_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.skip_tools = tool_names.into_iter().map(Into::into).collect::<BTreeSet<_>>();
        self
    }

    pub fn include_state_updates(mut self, enabled: bool) -> Self {
        self.config.include_state_updates = enabled;
        self
    }

    pub fn extractor<E>(mut self, extractor: E) -> Self
    where
        E: ToolExtractor + 'static,
    {
        self.extractors.register(extractor);
        self
    }

    /// Starts from an empty registry instead of the built-in extractors.
    pub fn without_builtin_extractors(mut self) -> Self {
        self.extractors = ExtractorRegistry::new();
        self
    }

    pub fn build(self) -> StreamParser {
        StreamParser::with_extractors(self.config, self.extractors)
    }
}
