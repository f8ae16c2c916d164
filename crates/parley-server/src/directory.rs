//! Process-wide room registry.
//!
//! The directory map is the only shared mutable state in the relay; every
//! other structure is owned by a single task. `get_or_create` is one
//! atomic check-then-insert critical section, so concurrent callers for
//! the same unknown id produce exactly one room.

use std::collections::HashMap;

use metrics::gauge;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::room::Room;

/// Registry mapping room id → running [`Room`].
pub struct Directory {
    rooms: Mutex<HashMap<String, Room>>,
    default_id: String,
    cancel: CancellationToken,
}

impl Directory {
    /// Create the directory and start the default room's loop. Called
    /// before the listener accepts any connection.
    pub fn new(default_id: impl Into<String>, cancel: CancellationToken) -> Self {
        let default_id = default_id.into();
        let mut rooms = HashMap::new();
        // The default room carries no display name, so its traffic is
        // never room-prefixed.
        let _ = rooms.insert(
            default_id.clone(),
            Room::spawn(default_id.clone(), None, cancel.clone()),
        );
        gauge!("rooms_active").set(1.0);
        Self {
            rooms: Mutex::new(rooms),
            default_id,
            cancel,
        }
    }

    /// Id of the room new connections start in.
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// The room new connections start in, recreated if it was deleted.
    pub fn default_room(&self) -> Room {
        self.get_or_create(&self.default_id)
    }

    /// Look up a room by id.
    pub fn get(&self, id: &str) -> Option<Room> {
        self.rooms.lock().get(id).cloned()
    }

    /// Return the room for `id`, creating and starting it if absent.
    ///
    /// The registry mutation is the sole synchronization point: at most
    /// one room is ever created per id, even under concurrent callers.
    pub fn get_or_create(&self, id: &str) -> Room {
        let mut rooms = self.rooms.lock();
        if let Some(room) = rooms.get(id) {
            return room.clone();
        }

        let name = (id != self.default_id).then(|| id.to_string());
        let room = Room::spawn(id.to_string(), name, self.cancel.clone());
        let _ = rooms.insert(id.to_string(), room.clone());
        gauge!("rooms_active").increment(1.0);
        info!(room = id, "room created");
        room
    }

    /// Remove `id` from the registry if its room is empty at the instant
    /// of the call; otherwise keep it and report a no-op.
    ///
    /// Deletion is advisory: a join that is queued but not yet processed
    /// by the room loop is not visible to the emptiness check and is not
    /// re-validated.
    pub fn delete(&self, id: &str) -> bool {
        let mut rooms = self.rooms.lock();
        match rooms.get(id) {
            Some(room) if room.is_empty() => {
                let _ = rooms.remove(id);
                gauge!("rooms_active").decrement(1.0);
                info!(room = id, "room deleted");
                true
            }
            Some(_) => {
                warn!(room = id, "room not empty, delete skipped");
                false
            }
            None => false,
        }
    }

    /// Snapshot of all registered room ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    /// Whether the registry holds no rooms at all.
    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }

    /// Connections currently registered across all rooms.
    pub fn connection_count(&self) -> usize {
        self.rooms.lock().values().map(Room::member_count).sum()
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("rooms", &self.len())
            .field("default_id", &self.default_id)
            .finish()
    }
}
