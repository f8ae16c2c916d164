//! WebSocket client connection state.
//!
//! A `ClientConnection` is the handle rooms and dispatch use to reach a
//! peer: the connection id plus the sending side of the bounded outbound
//! mailbox. The mailbox is drained by exactly one writer task; enqueueing
//! is always non-blocking so a slow consumer can never stall a room loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// An item on a connection's outbound mailbox.
#[derive(Clone, Debug)]
pub enum Outbound {
    /// A text frame to deliver; shared so fan-out does not copy the body.
    Frame(Arc<String>),
    /// Terminal signal: emit a close frame and stop the writer. Raised
    /// only by the connection's own teardown, never by a room.
    Close,
}

/// Represents a connected WebSocket peer.
pub struct ClientConnection {
    /// Unique connection id; doubles as the chat sender id.
    pub id: String,
    /// Send side of the outbound mailbox, drained by the writer task.
    tx: mpsc::Sender<Outbound>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the peer has responded since the last liveness check.
    is_alive: AtomicBool,
    /// When the last pong (or any liveness signal) was received.
    last_pong: Mutex<Instant>,
    /// Count of frames dropped due to a full or closed mailbox.
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection handle around a mailbox sender.
    pub fn new(id: String, tx: mpsc::Sender<Outbound>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a text frame without blocking.
    ///
    /// Returns `false` if the mailbox is full or closed, and increments
    /// the dropped-frame counter. Callers treat `false` as a dead peer.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(Outbound::Frame(frame)).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Raise the terminal close signal on the mailbox.
    ///
    /// Returns `false` if the signal could not be enqueued (mailbox full
    /// behind a wedged writer, or writer already gone).
    pub fn close(&self) -> bool {
        self.tx.try_send(Outbound::Close).is_ok()
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong or any peer activity).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag.
    ///
    /// Returns `true` if the peer showed life since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection(capacity: usize) -> (ClientConnection, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ClientConnection::new("conn_1".into(), tx), rx)
    }

    fn frame(text: &str) -> Arc<String> {
        Arc::new(text.to_string())
    }

    #[test]
    fn create_connection() {
        let (conn, _rx) = make_connection(8);
        assert_eq!(conn.id, "conn_1");
        assert_eq!(conn.drop_count(), 0);
    }

    #[tokio::test]
    async fn send_delivers_frame() {
        let (conn, mut rx) = make_connection(8);
        assert!(conn.send(frame("hello")));
        match rx.recv().await.unwrap() {
            Outbound::Frame(body) => assert_eq!(&*body, "hello"),
            Outbound::Close => panic!("expected frame"),
        }
    }

    #[tokio::test]
    async fn send_to_closed_mailbox_returns_false() {
        let (conn, rx) = make_connection(8);
        drop(rx);
        assert!(!conn.send(frame("hello")));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_mailbox_returns_false_and_counts() {
        let (conn, _rx) = make_connection(1);
        assert!(conn.send(frame("first")));
        assert!(!conn.send(frame("second")));
        assert!(!conn.send(frame("third")));
        assert_eq!(conn.drop_count(), 2);
    }

    #[tokio::test]
    async fn close_enqueues_terminal_signal() {
        let (conn, mut rx) = make_connection(8);
        assert!(conn.send(frame("pending")));
        assert!(conn.close());
        assert!(matches!(rx.recv().await.unwrap(), Outbound::Frame(_)));
        assert!(matches!(rx.recv().await.unwrap(), Outbound::Close));
    }

    #[tokio::test]
    async fn close_on_full_mailbox_returns_false() {
        let (conn, _rx) = make_connection(1);
        assert!(conn.send(frame("fills it")));
        assert!(!conn.close());
    }

    #[test]
    fn mark_alive_and_check() {
        let (conn, _rx) = make_connection(8);
        // Initially alive
        assert!(conn.check_alive());
        // Flag resets after a check
        assert!(!conn.check_alive());
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[test]
    fn last_pong_elapsed_resets_on_mark_alive() {
        let (conn, _rx) = make_connection(8);
        std::thread::sleep(Duration::from_millis(10));
        let before = conn.last_pong_elapsed();
        conn.mark_alive();
        assert!(conn.last_pong_elapsed() < before);
    }

    #[test]
    fn connection_age_increases() {
        let (conn, _rx) = make_connection(8);
        let age1 = conn.age();
        std::thread::sleep(Duration::from_millis(10));
        assert!(conn.age() > age1);
    }
}
