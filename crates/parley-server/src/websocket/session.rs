//! WebSocket session lifecycle — handles a single connected peer from
//! upgrade through disconnect.
//!
//! Exactly two tasks exist per live connection: the session task below is
//! the only reader, and the writer it spawns is the only writer. They
//! share nothing but the outbound mailbox and the liveness flags; the
//! current-room binding is a plain local of the read loop, because no
//! other task ever touches it.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::config::ServerConfig;
use crate::directory::Directory;
use crate::websocket::connection::{ClientConnection, Outbound};
use crate::websocket::dispatch;

/// Run a WebSocket session for a connected peer.
///
/// 1. Registers the connection in the default room
/// 2. Spawns the writer task (mailbox drain + liveness pings)
/// 3. Normalizes and dispatches every inbound payload
/// 4. On exit, always leaves the current room and raises the terminal
///    mailbox signal so the writer sends a close frame and stops
#[instrument(skip_all, fields(connection_id = %connection_id))]
pub async fn run_session(
    socket: WebSocket,
    connection_id: String,
    directory: Arc<Directory>,
    config: Arc<ServerConfig>,
) {
    let (ws_tx, mut ws_rx) = socket.split();

    let (send_tx, send_rx) = mpsc::channel::<Outbound>(config.mailbox_capacity);
    let connection = Arc::new(ClientConnection::new(connection_id, send_tx));

    let connection_start = std::time::Instant::now();
    info!("client connected");
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);

    let mut room = directory.default_room();
    room.join(Arc::clone(&connection)).await;

    let writer = tokio::spawn(run_writer(
        ws_tx,
        send_rx,
        Arc::clone(&connection),
        config.ping_interval(),
        config.pong_timeout(),
    ));

    while let Some(frame) = ws_rx.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    continue;
                }
            },
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                connection.mark_alive();
                continue;
            }
            Ok(Message::Close(_)) => {
                info!("client sent close frame");
                break;
            }
            Err(error) => {
                // Oversize frames, timeouts, and abnormal closes all land
                // here; terminal for this connection only.
                warn!(%error, "websocket read failed");
                break;
            }
        };

        let text = normalize(&text);
        dispatch::handle_payload(&text, &mut room, &connection, &directory).await;
    }

    // Teardown: departure from the current room is unconditional, and only
    // this path raises the mailbox's terminal signal.
    room.leave(connection.id.clone()).await;
    if !connection.close() {
        // Mailbox saturated behind a wedged writer; drop it instead of
        // waiting on a dead peer.
        writer.abort();
    }
    let _ = writer.await;

    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    histogram!("ws_connection_duration_seconds").record(connection_start.elapsed().as_secs_f64());
    info!("client disconnected");
}

/// Drain the outbound mailbox onto the socket and keep the peer honest
/// with periodic pings.
async fn run_writer(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut mailbox: mpsc::Receiver<Outbound>,
    connection: Arc<ClientConnection>,
    ping_interval: Duration,
    pong_timeout: Duration,
) {
    let mut ping = tokio::time::interval(ping_interval);
    // The first tick completes immediately; skip it.
    let _ = ping.tick().await;

    loop {
        tokio::select! {
            item = mailbox.recv() => {
                match item {
                    Some(Outbound::Frame(first)) => {
                        let (payload, close_after) = drain_burst(&mut mailbox, &first);
                        if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                        if close_after {
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if !connection.check_alive() && connection.last_pong_elapsed() > pong_timeout {
                    warn!(connection = %connection.id, "peer unresponsive, closing");
                    break;
                }
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Append already-queued frames to `first`, newline-separated, so a burst
/// becomes one transport write. Returns the combined payload and whether
/// the terminal close signal was drained along the way.
fn drain_burst(mailbox: &mut mpsc::Receiver<Outbound>, first: &str) -> (String, bool) {
    let mut payload = String::from(first);
    loop {
        match mailbox.try_recv() {
            Ok(Outbound::Frame(next)) => {
                payload.push('\n');
                payload.push_str(&next);
            }
            Ok(Outbound::Close) => return (payload, true),
            Err(_) => return (payload, false),
        }
    }
}

/// Trim outer whitespace and collapse embedded newlines to spaces.
fn normalize(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}
