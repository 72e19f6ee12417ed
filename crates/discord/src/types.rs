//! Wire types for the handful of Discord objects the exporter reads.
//!
//! Only the fields the collector uses are decoded; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};

/// Channel kinds the collector distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Text,
            2 => Self::Voice,
            4 => Self::Category,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Voice => 2,
            ChannelKind::Category => 4,
            ChannelKind::Other(other) => other,
        }
    }
}

/// A guild channel snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

impl Channel {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUser {
    pub id: String,
}

/// A guild member; only presence matters for counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<MemberUser>,
}

/// A channel message; only the id is kept, as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
}

impl Message {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_channel_kinds() {
        let json = r#"[
            {"id":"1","name":"general","type":0,"position":3},
            {"id":"2","name":"Lounge","type":2},
            {"id":"3","name":"Text Channels","type":4},
            {"id":"4","name":"announcements","type":5}
        ]"#;
        let channels: Vec<Channel> = serde_json::from_str(json).unwrap();
        let kinds: Vec<_> = channels.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [
            ChannelKind::Text,
            ChannelKind::Voice,
            ChannelKind::Category,
            ChannelKind::Other(5),
        ]);
        assert!(channels[0].is_text());
        assert!(!channels[3].is_text());
    }

    #[test]
    fn channel_without_name_decodes() {
        let channel: Channel = serde_json::from_str(r#"{"id":"9","type":0}"#).unwrap();
        assert_eq!(channel.name, "");
    }

    #[test]
    fn message_ignores_extra_fields() {
        let msg: Message =
            serde_json::from_str(r#"{"id":"111","content":"hi","author":{"id":"5"}}"#).unwrap();
        assert_eq!(msg.id, "111");
    }
}
