//! `/health` endpoint.

use std::time::Instant;

use serde::Serialize;

use crate::directory::Directory;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Connections currently registered across all rooms.
    pub connections: usize,
    /// Number of rooms in the directory.
    pub rooms: usize,
}

impl HealthResponse {
    /// Snapshot the live counters.
    pub fn gather(start_time: Instant, directory: &Directory) -> Self {
        Self {
            status: "ok".into(),
            uptime_secs: start_time.elapsed().as_secs(),
            connections: directory.connection_count(),
            rooms: directory.len(),
        }
    }
}
