//! # parley-server
//!
//! Axum HTTP + `WebSocket` relay server.
//!
//! - Broadcast rooms: one event-loop task per room, message-passing only
//! - Directory: process-wide room registry with lazy creation and
//!   advisory deletion
//! - Connections: one reader and one writer task per WebSocket peer,
//!   bridged by a bounded outbound mailbox
//! - Protocol dispatch: legacy text, `/switch` command, and structured
//!   action envelopes over the same connection
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod directory;
pub mod error;
pub mod health;
pub mod room;
pub mod server;
pub mod shutdown;
pub mod websocket;
