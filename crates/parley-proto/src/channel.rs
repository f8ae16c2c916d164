//! Channel (room) descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of channel (wire field `type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// One-to-one conversation.
    Direct,
    /// Multi-party broadcast room.
    Group,
    /// Unrecognized kind from a newer peer.
    #[serde(other)]
    Other,
}

/// A user participating in a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique user id.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Presence status (e.g. `online`, `away`).
    pub status: String,
    /// When the participant joined.
    pub joined_at: DateTime<Utc>,
}

/// Descriptor for a broadcast channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique channel id.
    pub id: String,
    /// Channel kind (wire name `type`).
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Known participants.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Build a freshly-stamped group channel descriptor with no
    /// participant information.
    pub fn group(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind: ChannelKind::Group,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
