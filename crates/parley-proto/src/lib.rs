//! # parley-proto
//!
//! Wire-format types for the Parley relay protocol.
//!
//! Two JSON formats travel over the same WebSocket connection:
//!
//! - the legacy chat envelope (`{"message": {...}}`) carrying a single
//!   [`ChatMessage`], and
//! - the structured action envelope (`{"metadata": ..., "channel": ...,
//!   "action": {"type": ..., "data": ...}}`) whose `data` shape is keyed
//!   by the action tag.
//!
//! Raw non-JSON text and the `/switch <room>` command are also accepted on
//! the wire; they are classified by the server, not here.

#![deny(unsafe_code)]

pub mod action;
pub mod channel;
pub mod envelope;
pub mod message;

pub use action::{Action, ActionKind, ChannelCreateData, ChannelListData, ChannelSwitchData, MessageSendData};
pub use channel::{Channel, ChannelKind, Participant};
pub use envelope::{ActionEnvelope, ChatEnvelope, Metadata, ServerNode, PROTOCOL_VERSION};
pub use message::{ChatMessage, Content, DeliveryStatus, FileContent, MessageKind, Reaction, TextContent};
