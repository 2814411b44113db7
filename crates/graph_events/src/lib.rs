#![forbid(unsafe_code)]
//! Normalization of agent-runtime chunk streams into typed events.
//!
//! The runtime streams loosely shaped JSON chunks: node-level state diffs on
//! the `updates` channel, token fragments on the `messages` channel, or
//! `[channel, payload]` pairs when several channels run at once. This crate
//! provides:
//! - A [`StreamParser`] that classifies the stream shape once, routes items to
//!   per-channel processors, and yields [`StreamEvent`]s (blocking iterator or
//!   `futures_core::Stream` behind the `async` feature).
//! - Tool-call lifecycle tracking ([`ToolCallTracker`]) and cross-channel
//!   deduplication ([`DedupPolicy`]).
//! - Interrupt canonicalization and resume-input builders.
//! - Pluggable tool-result extractors ([`ExtractorRegistry`]).
//! - JSONL chunk sources (sync, plus tokio behind the `tokio` feature).
//!
//! The crate logs through `tracing` and never installs a subscriber.

mod channel;
mod channels;
mod config;
mod dedup;
mod dispatch;
mod error;
mod events;
mod extract;
mod interrupt;
mod parser;
mod shape;
mod tracker;

pub mod jsonl;
pub mod legacy;
pub mod resume;

pub use channel::Channel;
pub use config::{ParserConfig, StreamMode};
pub use dedup::DedupPolicy;
pub use error::{ChunkReadError, ExtractError, ParserError};
pub use events::{
    ActionRequest, InterruptEvent, ReviewConfig, Role, StreamEvent, ToolOutcome,
};
pub use extract::{
    extractor_fn, Extracted, ExtractorRegistry, FnExtractor, ReflectionExtractor, TodoExtractor,
    ToolExtractor,
};
pub use interrupt::{canonicalize_interrupt, INTERRUPT_KEY};
pub use jsonl::{chunk_jsonl_file, ChunkJsonlReader};
pub use parser::{InfallibleItems, ParseEvents, StreamParser, StreamParserBuilder};
pub use resume::{
    create_resume_input, prepare_agent_input, AgentInput, Decision, DecisionKind, ResumeCommand,
};
pub use shape::TOOL_ERROR_PREFIXES;
pub use tracker::{Resolution, ToolCallRecord, ToolCallStatus, ToolCallTracker};

#[cfg(feature = "async")]
pub use parser::AsyncParseEvents;

#[cfg(feature = "tokio")]
pub use jsonl::AsyncChunkJsonlReader;
