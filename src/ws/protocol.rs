//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of match a player is searching for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Public ranked queue
    Normal,
    /// Invitation / custom rules
    Custom,
}

impl MatchType {
    /// Number of players a room of this type holds
    pub fn capacity(self) -> usize {
        match self {
            MatchType::Normal | MatchType::Custom => 2,
        }
    }
}

impl Default for MatchType {
    fn default() -> Self {
        Self::Normal
    }
}

/// Options sent with a search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchOptions {
    #[serde(rename = "type", default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub power_ups_enabled: bool,
}

/// Paddle side, fixed for a player once assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Slot index in the room's player list
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Room lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Waiting for players, or paused after everyone left
    Lobby,
    /// Simulation running
    Started,
    /// A player reached the winning score
    Finished,
}

/// Power-up variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Doubles ball velocity
    Speed,
    /// Doubles the receiving paddle's height
    Size,
    /// Freezes the ball in place
    Sticky,
    /// Shrinks the receiving paddle
    Death,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Speed,
        PowerUpKind::Size,
        PowerUpKind::Sticky,
        PowerUpKind::Death,
    ];
}

/// What an applied power-up acts upon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedTo {
    Left,
    Right,
    Ball,
}

impl From<Side> for AppliedTo {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => AppliedTo::Left,
            Side::Right => AppliedTo::Right,
        }
    }
}

/// Paddle movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Top,
    Bottom,
}

/// `bottom`/`down` move down; any other direction moves up
impl<'de> Deserialize<'de> for MoveDirection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "bottom" | "down" => MoveDirection::Bottom,
            _ => MoveDirection::Top,
        })
    }
}

/// Key transition reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEvent {
    Keydown,
    Keyup,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Find or create a room matching the options
    GameSearch { options: MatchOptions },

    /// Join a specific room (invitation)
    GameJoin { room_id: Uuid },

    /// Paddle input
    Move {
        direction: MoveDirection,
        event_type: KeyEvent,
        /// Sequence number for client-side reconciliation
        input_seq: u32,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        user_id: Uuid,
        session_id: Uuid,
        server_time: u64,
    },

    /// Placed in a room that is not ready yet (or paused)
    GameWaiting {
        room_id: Uuid,
        /// Last broadcast state of a paused match
        state: Option<GameStatus>,
    },

    /// Room is full, match about to begin
    GameStarting {
        room_id: Uuid,
        state: GameStatus,
        countdown: u32,
    },

    /// Per-tick snapshot
    GameStatus(GameStatus),

    /// Full state for a session rejoining a running match
    GameReconnect { state: GameStatus },

    /// Match is over and the room is being torn down
    GameEnded { winner_id: Option<Uuid> },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Full room snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatus {
    pub status: RoomStatus,
    pub ball: BallState,
    pub players: Vec<PlayerStatus>,
    pub power_ups: Vec<PowerUpState>,
    /// Server time of the tick that produced this snapshot
    pub server_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub last_hit_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub user_id: Uuid,
    pub side: Side,
    pub score: u32,
    pub connected: bool,
    /// Last input sequence applied by the server
    pub last_processed_input: u32,
    pub paddle: PaddleState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleState {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpState {
    pub x: f32,
    pub y: f32,
    pub kind: PowerUpKind,
    pub applied_to: Option<AppliedTo>,
}
