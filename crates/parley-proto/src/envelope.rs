//! Top-level wire envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind};
use crate::channel::Channel;
use crate::message::ChatMessage;

/// Protocol version stamped into outgoing metadata.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Identity and load of the node that produced a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerNode {
    /// Node id.
    pub id: String,
    /// Geographic region of the node.
    pub region: String,
    /// Load average of the node (0.0 - 1.0).
    pub load: f64,
}

/// Version and timing information attached to action envelopes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Protocol version.
    pub version: String,
    /// When the envelope was created.
    pub timestamp: DateTime<Utc>,
    /// The producing node, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_node: Option<ServerNode>,
}

impl Metadata {
    /// Metadata stamped with the current time and protocol version.
    pub fn now() -> Self {
        Self {
            version: PROTOCOL_VERSION.into(),
            timestamp: Utc::now(),
            server_node: None,
        }
    }
}

/// The legacy chat wire shape: a single message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    /// The carried message.
    pub message: ChatMessage,
}

impl ChatEnvelope {
    /// Wrap a message for the wire.
    pub fn new(message: ChatMessage) -> Self {
        Self { message }
    }
}

/// The structured action wire shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Envelope metadata; optional on requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Channel context; optional on requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// The requested action.
    pub action: Action,
}

impl ActionEnvelope {
    /// Build a server response envelope: fresh metadata, no channel
    /// context, the given tag and payload.
    pub fn response(kind: ActionKind, data: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            metadata: Some(Metadata::now()),
            channel: None,
            action: Action::new(kind, data)?,
        })
    }
}
