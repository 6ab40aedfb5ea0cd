//! Room placement: find, join or create a room for a searching player

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::registry::{RegistryError, RoomHandle, RoomRegistry};
use crate::game::room::{Room, Seat};
use crate::ws::protocol::{MatchOptions, Side};

/// How a player ended up in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Created,
    Joined,
    /// Already seated; the new session took over the slot
    Rebound,
}

/// Result of a successful placement
#[derive(Clone)]
pub struct Placement {
    pub room_id: Uuid,
    pub handle: RoomHandle,
    pub kind: PlacementKind,
    pub side: Side,
    /// Full with both sides connected at placement time
    pub ready: bool,
}

/// Places players into rooms.
///
/// Placement is serialized so two concurrent searches can neither both create
/// a room for the same match type nor overfill a single room.
pub struct Matchmaker {
    registry: Arc<RoomRegistry>,
    placement: Mutex<()>,
}

impl Matchmaker {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            placement: Mutex::new(()),
        }
    }

    /// Rebind into the user's live room, else take the first open room of the
    /// same match type, else create one.
    pub fn search(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        options: MatchOptions,
    ) -> Result<Placement, RegistryError> {
        let _placement = self.placement.lock();
        let handles = self.registry.handles();

        for handle in &handles {
            let mut room = handle.lock();
            if !room.is_live() || !room.contains_user(user_id) {
                continue;
            }
            if let Seat::Rebound(side) = room.seat(user_id, session_id) {
                return Ok(self.placed(handle, &room, session_id, PlacementKind::Rebound, side));
            }
        }

        for handle in &handles {
            let mut room = handle.lock();
            if !room.is_live() || room.options.match_type != options.match_type {
                continue;
            }
            if let Seat::Added(side) = room.seat(user_id, session_id) {
                return Ok(self.placed(handle, &room, session_id, PlacementKind::Joined, side));
            }
        }

        let mut room = Room::new(Uuid::new_v4(), options, rand::random());
        room.seat(user_id, session_id);
        let room_id = room.id;
        let handle = self.registry.insert(room)?;
        self.registry.bind_session(session_id, room_id);

        info!(
            room_id = %room_id,
            user_id = %user_id,
            match_type = ?options.match_type,
            power_ups = options.power_ups_enabled,
            "Created room"
        );

        Ok(Placement {
            room_id,
            handle,
            kind: PlacementKind::Created,
            side: Side::Left,
            ready: false,
        })
    }

    /// Join a specific room (invitation). Unknown, finished or full rooms
    /// yield no placement.
    pub fn join(&self, room_id: Uuid, user_id: Uuid, session_id: Uuid) -> Option<Placement> {
        let _placement = self.placement.lock();
        let handle = self.registry.get(&room_id)?;
        let mut room = handle.lock();
        if !room.is_live() {
            return None;
        }

        let (kind, side) = match room.seat(user_id, session_id) {
            Seat::Added(side) => (PlacementKind::Joined, side),
            Seat::Rebound(side) => (PlacementKind::Rebound, side),
            Seat::Full => {
                debug!(room_id = %room_id, user_id = %user_id, "Join rejected, room full");
                return None;
            }
        };
        Some(self.placed(&handle, &room, session_id, kind, side))
    }

    fn placed(
        &self,
        handle: &RoomHandle,
        room: &Room,
        session_id: Uuid,
        kind: PlacementKind,
        side: Side,
    ) -> Placement {
        self.registry.bind_session(session_id, room.id);
        debug!(room_id = %room.id, side = ?side, kind = ?kind, "Player placed");
        Placement {
            room_id: room.id,
            handle: handle.clone(),
            kind,
            side,
            ready: room.is_ready(),
        }
    }
}
