//! Room simulation modules

pub mod input;
pub mod physics;
pub mod powerups;
pub mod registry;
pub mod room;
pub mod score;
pub mod snapshot;
pub mod tick;

pub use registry::{RegistryError, RoomRegistry};
pub use tick::GameLoop;

use std::sync::Arc;

use crate::config::GameConfig;
use crate::store::{MatchRecordStore, UserDirectory};
use crate::ws::gateway::BroadcastGateway;

/// Everything a room loop needs besides its own room
#[derive(Clone)]
pub struct GameContext {
    pub registry: Arc<RoomRegistry>,
    pub gateway: Arc<dyn BroadcastGateway>,
    pub records: Arc<dyn MatchRecordStore>,
    pub users: Arc<dyn UserDirectory>,
    pub config: GameConfig,
}
