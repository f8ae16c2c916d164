//! Inbound payload classification and routing.
//!
//! Every normalized payload goes through the same tiers, in order:
//!
//! 1. the legacy `/switch <room-id>` command,
//! 2. a structured action envelope (tag-dispatched),
//! 3. a legacy chat envelope,
//! 4. plain text, reinterpreted as a best-effort chat message.
//!
//! Parse failures are never fatal; they fall through to the next tier.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use parley_proto::{
    Action, ActionEnvelope, ActionKind, Channel, ChannelCreateData, ChannelListData,
    ChannelSwitchData, ChatEnvelope, ChatMessage, MessageSendData,
};

use crate::directory::Directory;
use crate::room::Room;
use crate::websocket::connection::ClientConnection;

/// Legacy room-switch command prefix.
const SWITCH_COMMAND: &str = "/switch ";

/// Classify and handle one normalized inbound payload.
pub async fn handle_payload(
    text: &str,
    room: &mut Room,
    connection: &Arc<ClientConnection>,
    directory: &Directory,
) {
    // Tier 1: legacy "/switch <room-id>" command.
    if let Some(target_id) = text.strip_prefix(SWITCH_COMMAND) {
        if !target_id.is_empty() {
            info!(connection = %connection.id, target = target_id, "room switch requested (legacy command)");
            let target = directory.get_or_create(target_id);
            switch_room(room, target, connection).await;
            return;
        }
    }

    // Tier 2: structured action envelope.
    if let Ok(envelope) = serde_json::from_str::<ActionEnvelope>(text) {
        handle_action(envelope.action, room, connection, directory).await;
        return;
    }

    // Tier 3: legacy chat envelope.
    if let Ok(envelope) = serde_json::from_str::<ChatEnvelope>(text) {
        broadcast_chat(envelope.message, room).await;
        return;
    }

    // Tier 4: anything else is best-effort chat text.
    broadcast_chat(ChatMessage::text(connection.id.clone(), text), room).await;
}

/// Dispatch a decoded action by its tag.
async fn handle_action(
    action: Action,
    room: &mut Room,
    connection: &Arc<ClientConnection>,
    directory: &Directory,
) {
    match action.kind {
        ActionKind::SwitchChannel => match serde_json::from_value::<ChannelSwitchData>(action.data) {
            Ok(data) if !data.channel_id.is_empty() => {
                info!(connection = %connection.id, target = %data.channel_id, "room switch requested");
                let target = directory.get_or_create(&data.channel_id);
                switch_room(room, target, connection).await;
            }
            Ok(_) => warn!(connection = %connection.id, "switch_channel without a channel id"),
            Err(error) => warn!(connection = %connection.id, %error, "invalid switch_channel payload"),
        },

        ActionKind::ListChannels => {
            let channels = directory.ids().into_iter().map(Channel::group).collect();
            match ActionEnvelope::response(ActionKind::ListChannels, ChannelListData { channels }) {
                // Reply lands on the requesting connection only, never the room.
                Ok(response) => reply(connection, &response),
                Err(error) => warn!(%error, "failed to encode channel list"),
            }
        }

        ActionKind::SendMessage => match serde_json::from_value::<MessageSendData>(action.data) {
            Ok(data) => broadcast_chat(data.message, room).await,
            Err(error) => warn!(connection = %connection.id, %error, "invalid send_message payload"),
        },

        ActionKind::CreateChannel => match serde_json::from_value::<CreateChannelRequest>(action.data) {
            Ok(request) if !request.channel.id.is_empty() => {
                let _ = directory.get_or_create(&request.channel.id);
                let data = ChannelCreateData { channel: Channel::group(request.channel.id) };
                match ActionEnvelope::response(ActionKind::CreateChannel, data) {
                    Ok(response) => reply(connection, &response),
                    Err(error) => warn!(%error, "failed to encode create_channel response"),
                }
            }
            Ok(_) => warn!(connection = %connection.id, "create_channel without a channel id"),
            Err(error) => warn!(connection = %connection.id, %error, "invalid create_channel payload"),
        },

        kind => info!(connection = %connection.id, ?kind, "unhandled action type"),
    }
}

/// Move a connection to `target` without touching the transport.
pub async fn switch_room(current: &mut Room, target: Room, connection: &Arc<ClientConnection>) {
    if current.id() == target.id() {
        return;
    }

    current.leave(connection.id.clone()).await;
    *current = target;
    current.join(Arc::clone(connection)).await;

    let label = current.display_name().unwrap_or(current.id()).to_owned();
    let notice = ChatEnvelope::new(ChatMessage::system(format!("Switched to channel: {label}")));
    reply(connection, &notice);
    info!(connection = %connection.id, room = %current.id(), "connection switched room");
}

/// Room-prefix (when the room is named) and broadcast a chat message.
async fn broadcast_chat(mut message: ChatMessage, room: &Room) {
    if let Some(name) = room.display_name() {
        message.apply_room_prefix(name);
    }
    if let Some(json) = encode(&ChatEnvelope::new(message)) {
        room.broadcast(json).await;
    }
}

/// Enqueue an envelope on the connection's own mailbox.
fn reply(connection: &Arc<ClientConnection>, envelope: &impl Serialize) {
    if let Some(json) = encode(envelope) {
        if !connection.send(json) {
            warn!(connection = %connection.id, "failed to enqueue reply (mailbox full or closed)");
        }
    }
}

/// Serialize an outbound envelope; on failure the send is abandoned.
fn encode(envelope: &impl Serialize) -> Option<Arc<String>> {
    match serde_json::to_string(envelope) {
        Ok(json) => Some(Arc::new(json)),
        Err(error) => {
            warn!(%error, "failed to encode outbound envelope, dropping");
            None
        }
    }
}

/// Lenient `create_channel` request carrier: only the id is required,
/// the server stamps the rest of the descriptor.
#[derive(Deserialize)]
struct CreateChannelRequest {
    channel: ChannelIdOnly,
}

#[derive(Deserialize)]
struct ChannelIdOnly {
    id: String,
}
