//! Matchmaking: room placement, reconnection and request routing

pub mod reconnect;
pub mod rooms;
pub mod service;

pub use service::MatchmakingService;
