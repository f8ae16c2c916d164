//! Graceful shutdown coordination.
//!
//! One `CancellationToken` fans out to every long-lived task the relay
//! spawns: room loops watch it directly, and the HTTP listener uses it as
//! its graceful-shutdown signal. Tasks registered with [`track`] are
//! awaited during [`drain`], bounded by a timeout.
//!
//! [`track`]: ShutdownCoordinator::track
//! [`drain`]: ShutdownCoordinator::drain

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates graceful shutdown across all server tasks.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ShutdownCoordinator {
    /// How long [`drain`](Self::drain) waits before giving up on
    /// stragglers.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown without waiting for anything.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Register a task to be awaited during [`drain`](Self::drain).
    pub fn track(&self, handle: JoinHandle<()>) {
        self.tasks.lock().push(handle);
    }

    /// Cancel the token and wait up to `timeout` for every tracked task.
    /// Tasks still running afterwards are left to the runtime.
    pub async fn drain(&self, timeout: Duration) {
        self.token.cancel();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        info!(
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for server tasks to stop"
        );

        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!("shutdown timed out after {timeout:?}, some tasks may still be running");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
