//! Registry of all active rooms and the session-to-room index

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::room::Room;

/// Shared handle to a room. Never hold the lock across an `.await`.
pub type RoomHandle = Arc<Mutex<Room>>;

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Room token collision: {0}")]
    DuplicateToken(Uuid),
}

/// Registry of all active rooms.
///
/// Lock order is room mutex before map shard: handles are cloned out of the
/// maps before a room is locked, and removal happens with the room locked.
pub struct RoomRegistry {
    rooms: DashMap<Uuid, RoomHandle>,
    session_rooms: DashMap<Uuid, Uuid>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            session_rooms: DashMap::new(),
        }
    }

    /// Store a freshly created room
    pub fn insert(&self, room: Room) -> Result<RoomHandle, RegistryError> {
        let id = room.id;
        match self.rooms.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateToken(id)),
            Entry::Vacant(slot) => {
                let handle = Arc::new(Mutex::new(room));
                slot.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<RoomHandle> {
        self.rooms.get(id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.rooms.contains_key(id)
    }

    /// Point-in-time copy of every room handle, safe to lock afterwards
    pub fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.iter().map(|r| r.value().clone()).collect()
    }

    /// Delete a room. The caller holds the room's lock; the room is marked
    /// closed so in-flight loops and scans back off.
    pub fn remove_locked(&self, room: &mut Room) {
        room.closed = true;
        if self.rooms.remove(&room.id).is_some() {
            let id = room.id;
            self.session_rooms.retain(|_, room_id| *room_id != id);
            info!(room_id = %id, "Room removed from registry");
        }
    }

    pub fn bind_session(&self, session_id: Uuid, room_id: Uuid) {
        self.session_rooms.insert(session_id, room_id);
    }

    pub fn unbind_session(&self, session_id: &Uuid) -> Option<Uuid> {
        self.session_rooms.remove(session_id).map(|(_, room_id)| room_id)
    }

    pub fn room_for_session(&self, session_id: &Uuid) -> Option<Uuid> {
        self.session_rooms.get(session_id).map(|r| *r.value())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.handles().iter().map(|h| h.lock().players.len()).sum()
    }

    /// Close every room and empty the registry (server shutdown)
    pub fn drain(&self) -> usize {
        let handles = self.handles();
        for handle in &handles {
            handle.lock().closed = true;
        }
        self.rooms.clear();
        self.session_rooms.clear();
        handles.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
