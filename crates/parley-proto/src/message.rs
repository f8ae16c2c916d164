//! Chat message wire types.
//!
//! A [`ChatMessage`] carries its content as a tagged union: the sibling
//! `type` field is the discriminant and the `content` object's shape is
//! determined by it. Decoding goes through a raw carrier so the
//! discriminant is inspected first, never the content fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sender id used for server-generated notifications.
pub const SYSTEM_SENDER: &str = "system";

/// Message content discriminant (wire field `type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text content.
    Text,
    /// File attachment content.
    File,
}

/// Delivery status of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the relay.
    Sent,
    /// Delivered to at least one peer.
    Delivered,
    /// Read by a peer.
    Read,
}

/// Text message body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text body of the message.
    pub text: String,
}

/// File attachment body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// MIME type or format of the file.
    pub file_type: String,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Checksum for integrity verification.
    pub file_hash: String,
    /// Base64-encoded file content.
    pub file_data: String,
    /// Optional display caption.
    pub caption: String,
}

/// Message content; the variant is chosen by the sibling `type` field of
/// the enclosing [`ChatMessage`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    /// `type = "text"`.
    Text(TextContent),
    /// `type = "file"`.
    File(FileContent),
}

impl Content {
    /// The discriminant matching this content shape.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::File(_) => MessageKind::File,
        }
    }
}

/// Emoji reaction on a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Emoji character or code.
    pub emoji: String,
    /// Number of users who reacted with this emoji.
    pub count: u32,
    /// Ids of the reacting users.
    pub users: Vec<String>,
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChatMessage")]
pub struct ChatMessage {
    /// Unique message id.
    pub id: String,
    /// Id of the sending connection (or [`SYSTEM_SENDER`]).
    pub sender_id: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Content discriminant (wire name `type`).
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Content payload; shape keyed by `kind`.
    pub content: Content,
    /// Delivery status.
    pub status: DeliveryStatus,
    /// Emoji reactions.
    pub reactions: Vec<Reaction>,
}

/// Decode carrier: the `type` discriminant is read before `content` is
/// given a shape.
#[derive(Deserialize)]
struct RawChatMessage {
    id: String,
    sender_id: String,
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: MessageKind,
    content: Value,
    status: DeliveryStatus,
    #[serde(default)]
    reactions: Vec<Reaction>,
}

impl TryFrom<RawChatMessage> for ChatMessage {
    type Error = serde_json::Error;

    fn try_from(raw: RawChatMessage) -> Result<Self, Self::Error> {
        let content = match raw.kind {
            MessageKind::Text => Content::Text(serde_json::from_value(raw.content)?),
            MessageKind::File => Content::File(serde_json::from_value(raw.content)?),
        };
        Ok(Self {
            id: raw.id,
            sender_id: raw.sender_id,
            timestamp: raw.timestamp,
            kind: raw.kind,
            content,
            status: raw.status,
            reactions: raw.reactions,
        })
    }
}

impl ChatMessage {
    /// Build a freshly-stamped text message: generated id, current
    /// timestamp, `sent` status, no reactions.
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            sender_id: sender_id.into(),
            timestamp: Utc::now(),
            kind: MessageKind::Text,
            content: Content::Text(TextContent { text: text.into() }),
            status: DeliveryStatus::Sent,
            reactions: Vec::new(),
        }
    }

    /// Build a server-originated notification message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(SYSTEM_SENDER, text)
    }

    /// Prefix text content with a room label for display (`[room] text`).
    /// File content is left untouched.
    pub fn apply_room_prefix(&mut self, room: &str) {
        if let Content::Text(body) = &mut self.content {
            body.text = format!("[{room}] {}", body.text);
        }
    }
}

/// Generate a unique message id.
pub fn generate_message_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file_message() -> ChatMessage {
        ChatMessage {
            id: "m2".into(),
            sender_id: "c7".into(),
            timestamp: "2026-03-01T12:00:00Z".parse().unwrap(),
            kind: MessageKind::File,
            content: Content::File(FileContent {
                file_type: "image/png".into(),
                file_name: "cat.png".into(),
                file_size: 2048,
                file_hash: "abcd".into(),
                file_data: "aGVsbG8=".into(),
                caption: "a cat".into(),
            }),
            status: DeliveryStatus::Sent,
            reactions: vec![],
        }
    }

    // ── Construction ────────────────────────────────────────────────

    #[test]
    fn text_message_defaults() {
        let msg = ChatMessage::text("conn_1", "hello");
        assert_eq!(msg.sender_id, "conn_1");
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.status, DeliveryStatus::Sent);
        assert!(msg.reactions.is_empty());
        assert!(!msg.id.is_empty());
        assert_eq!(msg.content, Content::Text(TextContent { text: "hello".into() }));
    }

    #[test]
    fn system_message_sender() {
        let msg = ChatMessage::system("Switched to channel: room42");
        assert_eq!(msg.sender_id, SYSTEM_SENDER);
        assert_eq!(msg.kind, MessageKind::Text);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_message_id();
        let b = generate_message_id();
        assert_ne!(a, b);
    }

    // ── Room prefixing ──────────────────────────────────────────────

    #[test]
    fn room_prefix_applies_to_text() {
        let mut msg = ChatMessage::text("c1", "hi");
        msg.apply_room_prefix("room42");
        assert_eq!(msg.content, Content::Text(TextContent { text: "[room42] hi".into() }));
    }

    #[test]
    fn room_prefix_skips_file_content() {
        let mut msg = file_message();
        let before = msg.content.clone();
        msg.apply_room_prefix("room42");
        assert_eq!(msg.content, before);
    }

    // ── Wire format ─────────────────────────────────────────────────

    #[test]
    fn text_message_roundtrip() {
        let msg = ChatMessage::text("c1", "hello");
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn file_message_roundtrip() {
        let msg = file_message();
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn kind_serializes_as_type() {
        let msg = ChatMessage::text("c1", "x");
        let v: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "text");
        assert!(v.get("kind").is_none());
    }

    #[test]
    fn text_content_flattens_to_text_field() {
        let msg = ChatMessage::text("c1", "hi");
        let v: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["content"]["text"], "hi");
    }

    #[test]
    fn wire_format_text_fixture() {
        let raw = json!({
            "id": "m1",
            "sender_id": "c1",
            "timestamp": "2026-03-01T12:00:00Z",
            "type": "text",
            "content": {"text": "hello"},
            "status": "sent",
            "reactions": []
        });
        let msg: ChatMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.content, Content::Text(TextContent { text: "hello".into() }));
        assert_eq!(msg.status, DeliveryStatus::Sent);
    }

    #[test]
    fn wire_format_file_fixture() {
        let raw = json!({
            "id": "m2",
            "sender_id": "c7",
            "timestamp": "2026-03-01T12:00:00Z",
            "type": "file",
            "content": {
                "file_type": "image/png",
                "file_name": "cat.png",
                "file_size": 2048,
                "file_hash": "abcd",
                "file_data": "aGVsbG8=",
                "caption": "a cat"
            },
            "status": "sent",
            "reactions": []
        });
        let msg: ChatMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg, file_message());
    }

    #[test]
    fn content_shape_must_match_discriminant() {
        // type says file, content is a text body
        let raw = json!({
            "id": "m3",
            "sender_id": "c1",
            "timestamp": "2026-03-01T12:00:00Z",
            "type": "file",
            "content": {"text": "hello"},
            "status": "sent",
            "reactions": []
        });
        assert!(serde_json::from_value::<ChatMessage>(raw).is_err());
    }

    #[test]
    fn missing_reactions_defaults_to_empty() {
        let raw = json!({
            "id": "m4",
            "sender_id": "c1",
            "timestamp": "2026-03-01T12:00:00Z",
            "type": "text",
            "content": {"text": "hi"},
            "status": "sent"
        });
        let msg: ChatMessage = serde_json::from_value(raw).unwrap();
        assert!(msg.reactions.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let raw = json!({
            "id": "m5",
            "sender_id": "c1",
            "timestamp": "2026-03-01T12:00:00Z",
            "type": "voice",
            "content": {"text": "hi"},
            "status": "sent",
            "reactions": []
        });
        assert!(serde_json::from_value::<ChatMessage>(raw).is_err());
    }

    #[test]
    fn reaction_roundtrip() {
        let reaction = Reaction {
            emoji: "👍".into(),
            count: 2,
            users: vec!["u1".into(), "u2".into()],
        };
        let json = serde_json::to_string(&reaction).unwrap();
        let back: Reaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reaction);
    }

    #[test]
    fn content_kind_accessor() {
        assert_eq!(Content::Text(TextContent { text: String::new() }).kind(), MessageKind::Text);
        assert_eq!(file_message().content.kind(), MessageKind::File);
    }
}
