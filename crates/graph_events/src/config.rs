use std::collections::BTreeSet;

use serde::Deserialize;

use crate::channel::Channel;
use crate::error::ParserError;

/// Which channel(s) the raw stream carries.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(try_from = "StreamModeRepr")]
pub enum StreamMode {
    /// Items are bare payloads of one channel.
    Single(Channel),
    /// Items are `(channel_name, payload)` pairs.
    Multi(Vec<Channel>),
    /// Classify the first item and fix the mode for the rest of the stream.
    Auto,
}

impl Default for StreamMode {
    fn default() -> Self {
        StreamMode::updates()
    }
}

impl StreamMode {
    pub fn updates() -> Self {
        StreamMode::Single(Channel::Updates)
    }

    pub fn messages() -> Self {
        StreamMode::Single(Channel::Messages)
    }

    pub fn dual() -> Self {
        StreamMode::Multi(vec![Channel::Updates, Channel::Messages])
    }

    pub fn from_name(name: &str) -> Result<Self, ParserError> {
        match name {
            "auto" => Ok(StreamMode::Auto),
            other => Channel::from_tag(other)
                .map(StreamMode::Single)
                .ok_or_else(|| ParserError::UnsupportedStreamMode(other.to_string())),
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ParserError> {
        if names.is_empty() {
            return Err(ParserError::EmptyChannelList);
        }
        let mut channels = Vec::with_capacity(names.len());
        for name in names {
            let channel: Channel = name.as_ref().parse()?;
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        Ok(StreamMode::Multi(channels))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamModeRepr {
    Name(String),
    List(Vec<String>),
}

impl TryFrom<StreamModeRepr> for StreamMode {
    type Error = ParserError;

    fn try_from(repr: StreamModeRepr) -> Result<Self, Self::Error> {
        match repr {
            StreamModeRepr::Name(name) => StreamMode::from_name(&name),
            StreamModeRepr::List(names) => StreamMode::from_names(&names),
        }
    }
}

/// Immutable parser settings, fixed for the lifetime of one parser.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub stream_mode: StreamMode,
    pub track_tool_lifecycle: bool,
    pub skip_tools: BTreeSet<String>,
    pub include_state_updates: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            stream_mode: StreamMode::default(),
            track_tool_lifecycle: true,
            skip_tools: BTreeSet::new(),
            include_state_updates: false,
        }
    }
}

impl ParserConfig {
    /// Loads settings from a TOML document; omitted keys keep their defaults.
    ///
    /// ```toml
    /// stream_mode = ["updates", "messages"]
    /// skip_tools = ["think_tool"]
    /// include_state_updates = true
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self, ParserError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn skips(&self, tool_name: &str) -> bool {
        self.skip_tools.contains(tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_update_channel_parsing() {
        let config = ParserConfig::default();
        assert_eq!(config.stream_mode, StreamMode::Single(Channel::Updates));
        assert!(config.track_tool_lifecycle);
        assert!(!config.include_state_updates);
        assert!(config.skip_tools.is_empty());
    }

    #[test]
    fn mode_names_are_validated() {
        assert_eq!(StreamMode::from_name("auto"), Ok(StreamMode::Auto));
        assert_eq!(StreamMode::from_name("messages"), Ok(StreamMode::messages()));
        assert_eq!(
            StreamMode::from_name("values"),
            Err(ParserError::UnsupportedStreamMode("values".to_string()))
        );
        assert_eq!(
            StreamMode::from_names(&["updates", "values"]),
            Err(ParserError::UnsupportedChannel("values".to_string()))
        );
        assert_eq!(
            StreamMode::from_names::<&str>(&[]),
            Err(ParserError::EmptyChannelList)
        );
        assert_eq!(
            StreamMode::from_names(&["updates", "messages", "updates"]),
            Ok(StreamMode::dual())
        );
    }

    #[test]
    fn toml_document_overrides_defaults() {
        let config = ParserConfig::from_toml_str(
            r#"
stream_mode = ["updates", "messages"]
skip_tools = ["think_tool", "write_todos"]
include_state_updates = true
"#,
        )
        .unwrap();

        assert_eq!(config.stream_mode, StreamMode::dual());
        assert!(config.track_tool_lifecycle);
        assert!(config.include_state_updates);
        assert!(config.skips("think_tool"));
        assert!(!config.skips("search"));
    }

    #[test]
    fn toml_rejects_unknown_modes_and_keys() {
        let err = ParserConfig::from_toml_str("stream_mode = \"values\"").unwrap_err();
        assert!(matches!(err, ParserError::Config(_)));
        assert!(err.to_string().contains("values"));

        let err = ParserConfig::from_toml_str("verbose = true").unwrap_err();
        assert!(matches!(err, ParserError::Config(_)));
    }
}
