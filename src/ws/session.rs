//! Transport session binding: session id <-> user id, plus outbound channels

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::ws::gateway::BroadcastGateway;
use crate::ws::protocol::ServerMsg;

/// Outbound frames buffered per session before frames are dropped
pub const SESSION_BUFFER: usize = 128;

struct BoundSession {
    user_id: Uuid,
    tx: mpsc::Sender<String>,
}

/// Maps transport sessions to users. A user may hold several sessions (tabs).
pub struct SessionBinding {
    sessions: DashMap<Uuid, BoundSession>,
    users: DashMap<Uuid, Vec<Uuid>>,
}

impl SessionBinding {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            users: DashMap::new(),
        }
    }

    /// Register an authenticated connection, returning its session id
    pub fn bind(&self, user_id: Uuid, tx: mpsc::Sender<String>) -> Uuid {
        let session_id = Uuid::new_v4();
        self.sessions.insert(session_id, BoundSession { user_id, tx });
        self.users.entry(user_id).or_default().push(session_id);
        session_id
    }

    /// Drop a session, returning the user it belonged to
    pub fn unbind(&self, session_id: &Uuid) -> Option<Uuid> {
        let (_, bound) = self.sessions.remove(session_id)?;
        if let Some(mut sessions) = self.users.get_mut(&bound.user_id) {
            sessions.retain(|s| s != session_id);
        }
        self.users.remove_if(&bound.user_id, |_, sessions| sessions.is_empty());
        Some(bound.user_id)
    }

    pub fn resolve(&self, session_id: &Uuid) -> Option<Uuid> {
        self.sessions.get(session_id).map(|s| s.user_id)
    }

    pub fn sessions_of(&self, user_id: &Uuid) -> Vec<Uuid> {
        self.users
            .get(user_id)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    pub fn is_online(&self, user_id: &Uuid) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn connected_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Direct reply to a single session
    pub fn send_to(&self, session_id: Uuid, msg: &ServerMsg) {
        self.deliver(&[session_id], msg);
    }

    fn push(&self, session_id: &Uuid, frame: &str) {
        let Some(tx) = self.sessions.get(session_id).map(|s| s.tx.clone()) else {
            return;
        };
        match tx.try_send(frame.to_owned()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session_id = %session_id, "Session lagging, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(session_id = %session_id, "Session channel closed");
            }
        }
    }
}

impl Default for SessionBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastGateway for SessionBinding {
    fn deliver(&self, sessions: &[Uuid], msg: &ServerMsg) {
        let frame = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize server message");
                return;
            }
        };
        for session_id in sessions {
            self.push(session_id, &frame);
        }
    }
}
