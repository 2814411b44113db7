use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParserError;

/// One upstream output mode.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Node-level state diffs (`{node: {key: value}}`).
    Updates,
    /// Token-level generation fragments (`(chunk, metadata)`).
    Messages,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Updates, Channel::Messages];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Updates => "updates",
            Channel::Messages => "messages",
        }
    }

    /// Resolves a channel name as it appears on a tagged stream item.
    ///
    /// Unknown names resolve to `None`; the dispatcher drops those items.
    pub fn from_tag(raw: &str) -> Option<Self> {
        match raw {
            "updates" => Some(Channel::Updates),
            "messages" => Some(Channel::Messages),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::from_tag(s).ok_or_else(|| ParserError::UnsupportedChannel(s.to_string()))
    }
}
