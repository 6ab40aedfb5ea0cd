//! Session loss and return

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::game::registry::RoomRegistry;
use crate::game::room::Room;
use crate::game::snapshot::SnapshotBuilder;
use crate::ws::protocol::{RoomStatus, ServerMsg};

/// What a disconnect did to the room the session was seated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Session held no slot (never seated, or already rebound elsewhere)
    Untracked,
    /// Slot cleared; someone is still connected, or the room is finishing
    Vacated { room_id: Uuid },
    /// Last session left a running match; state kept for a return
    Paused { room_id: Uuid },
    /// Last session left a lobby; room deleted
    Removed { room_id: Uuid },
}

pub struct ReconnectionHandler {
    registry: Arc<RoomRegistry>,
}

impl ReconnectionHandler {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Clear the session's slot and apply the empty-room policy.
    ///
    /// Only a slot still holding this exact session is cleared, so a rebind
    /// that won the race against this disconnect stays in place.
    pub fn disconnect(&self, session_id: Uuid) -> Departure {
        let Some(room_id) = self.registry.unbind_session(&session_id) else {
            return Departure::Untracked;
        };
        let Some(handle) = self.registry.get(&room_id) else {
            return Departure::Untracked;
        };

        let mut room = handle.lock();
        if room.closed || !room.release_session(session_id) {
            debug!(room_id = %room_id, session_id = %session_id, "Stale disconnect ignored");
            return Departure::Untracked;
        }
        if room.has_active_sessions() {
            return Departure::Vacated { room_id };
        }

        match room.status {
            RoomStatus::Lobby => {
                self.registry.remove_locked(&mut room);
                Departure::Removed { room_id }
            }
            RoomStatus::Started => {
                room.status = RoomStatus::Lobby;
                Departure::Paused { room_id }
            }
            RoomStatus::Finished => Departure::Vacated { room_id },
        }
    }

    /// Reply for a session (re)entering a room that is not about to start
    pub fn resume_message(room: &Room) -> ServerMsg {
        match room.status {
            RoomStatus::Started => ServerMsg::GameReconnect {
                state: SnapshotBuilder::build(room),
            },
            RoomStatus::Lobby | RoomStatus::Finished => ServerMsg::GameWaiting {
                room_id: room.id,
                state: room.previous_snapshot.clone(),
            },
        }
    }
}
