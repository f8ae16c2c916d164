//! Action tags and their typed payloads.
//!
//! An [`Action`] carries a `type` tag and a free-form `data` object. The
//! tag is decoded first; `data` is decoded into the payload struct matching
//! the tag by whoever dispatches the action.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::Channel;
use crate::message::ChatMessage;

/// Tag identifying what an action envelope asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Move the connection to another channel.
    SwitchChannel,
    /// Request the list of known channels.
    ListChannels,
    /// Create a channel (idempotent).
    CreateChannel,
    /// Join a channel.
    JoinChannel,
    /// Leave a channel.
    LeaveChannel,
    /// Broadcast a chat message to the current channel.
    SendMessage,
    /// Edit a previously sent message.
    EditMessage,
    /// Delete a previously sent message.
    DeleteMessage,
    /// React to a message.
    ReactMessage,
    /// A user joined.
    UserJoin,
    /// A user left.
    UserLeave,
    /// A user is typing.
    UserTyping,
    /// A user presence update.
    UserPresence,
    /// Any tag this build does not recognize.
    #[serde(other)]
    Other,
}

/// An action: tag plus tag-keyed payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    /// The action tag (wire name `type`).
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Payload; shape keyed by `kind`.
    #[serde(default)]
    pub data: Value,
}

impl Action {
    /// Build an action from a tag and a serializable payload.
    pub fn new(kind: ActionKind, data: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self { kind, data: serde_json::to_value(data)? })
    }
}

/// Payload of `switch_channel`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelSwitchData {
    /// Target channel id.
    pub channel_id: String,
}

/// Payload of a `list_channels` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelListData {
    /// Known channels.
    pub channels: Vec<Channel>,
}

/// Payload of `create_channel` (request and response).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelCreateData {
    /// The channel to create, or the created descriptor.
    pub channel: Channel,
}

/// Payload of `send_message`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageSendData {
    /// The message to broadcast.
    pub message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_uses_snake_case_tags() {
        assert_eq!(serde_json::to_value(ActionKind::SwitchChannel).unwrap(), "switch_channel");
        assert_eq!(serde_json::to_value(ActionKind::ListChannels).unwrap(), "list_channels");
        assert_eq!(serde_json::to_value(ActionKind::CreateChannel).unwrap(), "create_channel");
        assert_eq!(serde_json::to_value(ActionKind::SendMessage).unwrap(), "send_message");
    }

    #[test]
    fn unknown_tag_maps_to_other() {
        let kind: ActionKind = serde_json::from_value(json!("vanish_message")).unwrap();
        assert_eq!(kind, ActionKind::Other);
    }

    #[test]
    fn action_tag_serializes_as_type() {
        let action = Action::new(ActionKind::ListChannels, json!({})).unwrap();
        let v: Value = serde_json::to_value(&action).unwrap();
        assert_eq!(v["type"], "list_channels");
        assert!(v.get("kind").is_none());
    }

    #[test]
    fn action_data_defaults_to_null() {
        let action: Action = serde_json::from_value(json!({"type": "list_channels"})).unwrap();
        assert_eq!(action.kind, ActionKind::ListChannels);
        assert!(action.data.is_null());
    }

    #[test]
    fn action_missing_type_is_rejected() {
        assert!(serde_json::from_value::<Action>(json!({"data": {}})).is_err());
    }

    #[test]
    fn switch_payload_decodes_from_action_data() {
        let action: Action = serde_json::from_value(json!({
            "type": "switch_channel",
            "data": {"channel_id": "room42"}
        }))
        .unwrap();
        let data: ChannelSwitchData = serde_json::from_value(action.data).unwrap();
        assert_eq!(data.channel_id, "room42");
    }

    #[test]
    fn create_payload_roundtrip() {
        let data = ChannelCreateData { channel: Channel::group("r9") };
        let v = serde_json::to_value(&data).unwrap();
        assert_eq!(v["channel"]["id"], "r9");
        let back: ChannelCreateData = serde_json::from_value(v).unwrap();
        assert_eq!(back.channel.id, "r9");
    }

    #[test]
    fn message_payload_decodes() {
        let data: MessageSendData = serde_json::from_value(json!({
            "message": {
                "id": "m1",
                "sender_id": "c1",
                "timestamp": "2026-03-01T12:00:00Z",
                "type": "text",
                "content": {"text": "hi"},
                "status": "sent",
                "reactions": []
            }
        }))
        .unwrap();
        assert_eq!(data.message.sender_id, "c1");
    }

    #[test]
    fn list_payload_serializes_channels_array() {
        let data = ChannelListData { channels: vec![Channel::group("a"), Channel::group("b")] };
        let v = serde_json::to_value(&data).unwrap();
        assert_eq!(v["channels"].as_array().unwrap().len(), 2);
    }
}
