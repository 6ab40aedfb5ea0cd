//! Outbound delivery interface used by the room core

use uuid::Uuid;

use crate::game::room::Room;
use crate::game::snapshot::SnapshotBuilder;
use crate::ws::protocol::ServerMsg;

/// Pushes serialized messages to transport sessions.
/// Unknown or closed sessions are skipped silently.
pub trait BroadcastGateway: Send + Sync {
    fn deliver(&self, sessions: &[Uuid], msg: &ServerMsg);
}

/// A message addressed to every bound session of a room, captured under the
/// room lock and delivered after it is released
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub sessions: Vec<Uuid>,
    pub msg: ServerMsg,
}

impl RoomBroadcast {
    /// Current snapshot for both players (`game_status`)
    pub fn status(room: &mut Room) -> Self {
        let snapshot = SnapshotBuilder::build_and_record(room);
        Self {
            sessions: room.active_sessions(),
            msg: ServerMsg::GameStatus(snapshot),
        }
    }

    /// One-shot lifecycle event (`game_starting`, `game_ended`, ...)
    pub fn lifecycle(room: &Room, msg: ServerMsg) -> Self {
        Self {
            sessions: room.active_sessions(),
            msg,
        }
    }

    pub fn send(&self, gateway: &dyn BroadcastGateway) {
        if !self.sessions.is_empty() {
            gateway.deliver(&self.sessions, &self.msg);
        }
    }
}
