//! Broadcast room event loop.
//!
//! Each room is a single spawned task owning its member set; join, leave,
//! and broadcast requests arrive over dedicated mailboxes, so membership
//! is only ever mutated by the room's own loop. Fan-out is non-blocking:
//! a member whose outbound mailbox is full is treated as dead and evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::websocket::connection::ClientConnection;

/// Capacity of the join/leave control mailboxes.
const CONTROL_CAPACITY: usize = 64;

/// Capacity of the broadcast-in mailbox.
const BROADCAST_CAPACITY: usize = 256;

/// Cloneable handle to a running room.
#[derive(Clone)]
pub struct Room {
    id: Arc<str>,
    name: Option<Arc<str>>,
    join_tx: mpsc::Sender<Arc<ClientConnection>>,
    leave_tx: mpsc::Sender<String>,
    broadcast_tx: mpsc::Sender<Arc<String>>,
    /// Maintained by the loop; read by the directory's advisory
    /// emptiness check.
    member_count: Arc<AtomicUsize>,
}

impl Room {
    /// Create a room and start its event loop. The loop runs until
    /// `cancel` fires.
    pub fn spawn(id: String, name: Option<String>, cancel: CancellationToken) -> Self {
        let (join_tx, join_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (leave_tx, leave_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_CAPACITY);
        let member_count = Arc::new(AtomicUsize::new(0));

        let id: Arc<str> = id.into();
        let _ = tokio::spawn(run(
            Arc::clone(&id),
            join_rx,
            leave_rx,
            broadcast_rx,
            Arc::clone(&member_count),
            cancel,
        ));

        Self {
            id,
            name: name.map(Into::into),
            join_tx,
            leave_tx,
            broadcast_tx,
            member_count,
        }
    }

    /// The room id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name used for room-prefixing; the default room has none.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Ask the loop to add a member.
    pub async fn join(&self, member: Arc<ClientConnection>) {
        let _ = self.join_tx.send(member).await;
    }

    /// Ask the loop to remove a member. The member's outbound mailbox is
    /// left open; only the connection's own teardown closes it.
    pub async fn leave(&self, connection_id: String) {
        let _ = self.leave_tx.send(connection_id).await;
    }

    /// Submit a frame for fan-out to all current members.
    pub async fn broadcast(&self, payload: Arc<String>) {
        let _ = self.broadcast_tx.send(payload).await;
    }

    /// Number of members as of the last processed mutation.
    pub fn member_count(&self) -> usize {
        self.member_count.load(Ordering::Relaxed)
    }

    /// Advisory emptiness check used by directory deletion. A join still
    /// sitting in the mailbox is not visible here.
    pub fn is_empty(&self) -> bool {
        self.member_count() == 0
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("members", &self.member_count())
            .finish()
    }
}

/// The room event loop: waits on the three mailboxes, owns the roster.
#[instrument(skip_all, fields(room = %id))]
async fn run(
    id: Arc<str>,
    mut join_rx: mpsc::Receiver<Arc<ClientConnection>>,
    mut leave_rx: mpsc::Receiver<String>,
    mut broadcast_rx: mpsc::Receiver<Arc<String>>,
    member_count: Arc<AtomicUsize>,
    cancel: CancellationToken,
) {
    let mut roster: HashMap<String, Arc<ClientConnection>> = HashMap::new();

    loop {
        tokio::select! {
            Some(member) = join_rx.recv() => {
                debug!(connection = %member.id, "member joined");
                let _ = roster.insert(member.id.clone(), member);
                member_count.store(roster.len(), Ordering::Relaxed);
            }
            Some(connection_id) = leave_rx.recv() => {
                if roster.remove(&connection_id).is_some() {
                    debug!(connection = %connection_id, "member left");
                }
                member_count.store(roster.len(), Ordering::Relaxed);
            }
            Some(payload) = broadcast_rx.recv() => {
                roster.retain(|connection_id, member| {
                    if member.send(Arc::clone(&payload)) {
                        true
                    } else {
                        warn!(connection = %connection_id, "outbound mailbox saturated, evicting member");
                        false
                    }
                });
                member_count.store(roster.len(), Ordering::Relaxed);
            }
            () = cancel.cancelled() => {
                debug!("room loop stopped");
                break;
            }
        }
    }
}
