//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{GameContext, RoomRegistry};
use crate::matchmaking::MatchmakingService;
use crate::store::{SupabaseClient, SupabaseMatchStore, SupabaseUserDirectory};
use crate::ws::session::SessionBinding;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<RoomRegistry>,
    pub sessions: Arc<SessionBinding>,
    pub matchmaking: Arc<MatchmakingService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let supabase = SupabaseClient::new(&config);
        let sessions = Arc::new(SessionBinding::new());

        let ctx = GameContext {
            registry: Arc::new(RoomRegistry::new()),
            gateway: sessions.clone(),
            records: Arc::new(SupabaseMatchStore::new(supabase.clone())),
            users: Arc::new(SupabaseUserDirectory::new(supabase)),
            config: config.game.clone(),
        };

        Self::from_parts(config, ctx, sessions)
    }

    pub fn from_parts(config: Config, ctx: GameContext, sessions: Arc<SessionBinding>) -> Self {
        Self {
            config: Arc::new(config),
            registry: ctx.registry.clone(),
            matchmaking: Arc::new(MatchmakingService::new(ctx, sessions.clone())),
            sessions,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::testing::TestHarness;

    pub const JWT_SECRET: &str = "route-test-secret";

    /// State over in-memory stores; no network is touched
    pub fn test_state(harness: &TestHarness) -> AppState {
        let config = Config {
            server_addr: ([127, 0, 0, 1], 0).into(),
            log_level: "debug".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_role_key: "service-role".to_string(),
            supabase_jwt_secret: JWT_SECRET.to_string(),
            client_origin: "http://localhost:5173".to_string(),
            game: GameConfig::default(),
        };
        AppState::from_parts(config, harness.ctx.clone(), Arc::new(SessionBinding::new()))
    }
}
