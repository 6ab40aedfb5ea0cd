//! Matchmaking service - routes client requests to rooms and starts loops

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::game::input::{apply_move, MoveInput};
use crate::game::{GameContext, GameLoop, RegistryError};
use crate::store::{announce_presence, Presence};
use crate::util::time::unix_millis;
use crate::ws::protocol::{KeyEvent, MatchOptions, MoveDirection, RoomStatus, ServerMsg};
use crate::ws::session::SessionBinding;

use super::reconnect::{Departure, ReconnectionHandler};
use super::rooms::{Matchmaker, Placement};

/// The only entry point the transport layer talks to
pub struct MatchmakingService {
    ctx: GameContext,
    sessions: Arc<SessionBinding>,
    matchmaker: Matchmaker,
    reconnection: ReconnectionHandler,
}

impl MatchmakingService {
    pub fn new(ctx: GameContext, sessions: Arc<SessionBinding>) -> Self {
        Self {
            matchmaker: Matchmaker::new(ctx.registry.clone()),
            reconnection: ReconnectionHandler::new(ctx.registry.clone()),
            ctx,
            sessions,
        }
    }

    /// Bind a freshly authenticated connection
    pub fn connect(&self, user_id: Uuid, tx: mpsc::Sender<String>) -> Uuid {
        let session_id = self.sessions.bind(user_id, tx);
        announce_presence(&self.ctx.users, user_id, Presence::Online);
        info!(
            user_id = %user_id,
            session_id = %session_id,
            tabs = self.sessions.sessions_of(&user_id).len(),
            "Session connected"
        );
        session_id
    }

    /// Find or create a room for the session's user
    pub fn handle_search(&self, session_id: Uuid, options: MatchOptions) {
        let Some(user_id) = self.sessions.resolve(&session_id) else {
            debug!(session_id = %session_id, "Search from unbound session dropped");
            return;
        };

        match self.matchmaker.search(user_id, session_id, options) {
            Ok(placement) => self.settle(session_id, placement),
            Err(e @ RegistryError::DuplicateToken(_)) => {
                error!(user_id = %user_id, error = %e, "Room placement failed");
                self.reply(
                    session_id,
                    ServerMsg::Error {
                        code: "room_unavailable".to_string(),
                        message: "Could not create a room, try again".to_string(),
                    },
                );
            }
        }
    }

    /// Join a specific room; unknown or full rooms are ignored
    pub fn handle_join(&self, session_id: Uuid, room_id: Uuid) {
        let Some(user_id) = self.sessions.resolve(&session_id) else {
            debug!(session_id = %session_id, "Join from unbound session dropped");
            return;
        };

        match self.matchmaker.join(room_id, user_id, session_id) {
            Some(placement) => self.settle(session_id, placement),
            None => debug!(room_id = %room_id, user_id = %user_id, "Join ignored"),
        }
    }

    /// Apply paddle input to the session's room
    pub fn handle_move(
        &self,
        session_id: Uuid,
        direction: MoveDirection,
        event: KeyEvent,
        input_seq: u32,
    ) {
        let Some(user_id) = self.sessions.resolve(&session_id) else {
            return;
        };
        let Some(handle) = self
            .ctx
            .registry
            .room_for_session(&session_id)
            .and_then(|room_id| self.ctx.registry.get(&room_id))
        else {
            return;
        };

        let mut room = handle.lock();
        if room.closed {
            return;
        }
        apply_move(
            &mut room,
            MoveInput {
                user_id,
                direction,
                event,
                input_seq,
                received_at: unix_millis(),
            },
        );
    }

    /// Transport closed: vacate the slot, then drop the binding
    pub fn handle_disconnect(&self, session_id: Uuid) {
        match self.reconnection.disconnect(session_id) {
            Departure::Untracked => {}
            Departure::Vacated { room_id } => {
                debug!(room_id = %room_id, session_id = %session_id, "Player left room")
            }
            Departure::Paused { room_id } => {
                info!(room_id = %room_id, "All players gone, match paused")
            }
            Departure::Removed { room_id } => info!(room_id = %room_id, "Empty lobby removed"),
        }

        if let Some(user_id) = self.sessions.unbind(&session_id) {
            if !self.sessions.is_online(&user_id) {
                announce_presence(&self.ctx.users, user_id, Presence::Offline);
            }
            info!(user_id = %user_id, session_id = %session_id, "Session disconnected");
        }
    }

    /// The user's live room, if any
    pub fn current_room(&self, user_id: Uuid) -> Option<(Uuid, RoomStatus)> {
        self.ctx.registry.handles().into_iter().find_map(|handle| {
            let room = handle.lock();
            (room.is_live() && room.contains_user(user_id)).then(|| (room.id, room.status))
        })
    }

    /// Start the room when it just became ready, otherwise tell the session
    /// where it stands
    fn settle(&self, session_id: Uuid, placement: Placement) {
        debug!(
            room_id = %placement.room_id,
            session_id = %session_id,
            side = ?placement.side,
            kind = ?placement.kind,
            ready = placement.ready,
            "Placement settled"
        );
        if placement.ready && GameLoop::start(&self.ctx, placement.handle.clone()) {
            return;
        }

        let msg = {
            let room = placement.handle.lock();
            if room.closed {
                return;
            }
            ReconnectionHandler::resume_message(&room)
        };
        self.reply(session_id, msg);
    }

    fn reply(&self, session_id: Uuid, msg: ServerMsg) {
        self.ctx.gateway.deliver(&[session_id], &msg);
    }
}
