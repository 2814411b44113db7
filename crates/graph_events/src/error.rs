use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("unsupported stream mode: {0:?} (expected \"updates\", \"messages\", \"auto\" or a list of channels)")]
    UnsupportedStreamMode(String),
    #[error("unsupported channel in stream mode list: {0:?} (expected \"updates\" or \"messages\")")]
    UnsupportedChannel(String),
    #[error("stream mode list must name at least one channel")]
    EmptyChannelList,
    #[error("parse_chunk does not support automatic mode detection; use parse() instead")]
    ChunkInAutoMode,
    #[error("invalid parser configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for ParserError {
    fn from(err: toml::de::Error) -> Self {
        ParserError::Config(err.to_string())
    }
}

/// Failure raised inside a tool extractor. Always swallowed by the channel
/// processors; surfaced only to callers invoking an extractor directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("extractor for {tool_name:?} failed: {message}")]
pub struct ExtractError {
    pub tool_name: String,
    pub message: String,
}

impl ExtractError {
    pub fn new(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChunkReadError {
    #[error("I/O error while reading chunk line {line_number}: {source}")]
    Io {
        line_number: usize,
        source: std::io::Error,
    },
    #[error("chunk line {line_number} is not valid JSON: {source}")]
    Json {
        line_number: usize,
        source: serde_json::Error,
    },
}

impl ChunkReadError {
    pub fn line_number(&self) -> usize {
        match self {
            ChunkReadError::Io { line_number, .. } | ChunkReadError::Json { line_number, .. } => {
                *line_number
            }
        }
    }
}
