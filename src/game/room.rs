//! Room state: players, paddles, ball and power-ups

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{
    AppliedTo, GameStatus, MatchOptions, PowerUpKind, RoomStatus, Side,
};

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 600.0;
pub const CENTER_X: f32 = FIELD_WIDTH / 2.0;
pub const CENTER_Y: f32 = FIELD_HEIGHT / 2.0;

pub const PADDLE_WIDTH: f32 = 20.0;
pub const PADDLE_HEIGHT: f32 = 75.0;
pub const LEFT_PADDLE_X: f32 = 50.0;
pub const RIGHT_PADDLE_X: f32 = 750.0;

/// Horizontal serve speed in px/tick
pub const SERVE_SPEED: f32 = 3.0;

pub const WINNING_SCORE: u32 = 5;

/// Paddle state (authoritative)
#[derive(Debug, Clone)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub color: &'static str,
    pub key_released: bool,
    pub key_pressed_at: Option<u64>,
    pub last_processed_input: u32,
}

impl Paddle {
    pub fn for_side(side: Side) -> Self {
        let (x, color) = match side {
            Side::Left => (LEFT_PADDLE_X, "green"),
            Side::Right => (RIGHT_PADDLE_X, "red"),
        };
        Self {
            x,
            y: CENTER_Y,
            vy: 0.0,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            color,
            key_released: true,
            key_pressed_at: None,
            last_processed_input: 0,
        }
    }
}

/// Player slot in a room. The slot outlives the transport session.
#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: Uuid,
    /// Bound transport session, `None` while disconnected
    pub session_id: Option<Uuid>,
    pub side: Side,
    pub paddle: Paddle,
    pub score: u32,
}

impl Player {
    pub fn new(user_id: Uuid, session_id: Uuid, side: Side) -> Self {
        Self {
            user_id,
            session_id: Some(session_id),
            side,
            paddle: Paddle::for_side(side),
            score: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub last_hit_at: Option<u64>,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            x: CENTER_X,
            y: CENTER_Y,
            vx: 0.0,
            vy: 0.0,
            last_hit_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PowerUp {
    pub x: f32,
    pub y: f32,
    pub kind: PowerUpKind,
    pub duration_secs: f32,
    pub applied_at: Option<u64>,
    pub applied_to: Option<AppliedTo>,
}

impl PowerUp {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Outcome of trying to seat a user in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    /// New slot created on this side
    Added(Side),
    /// User already had a slot; session rebound
    Rebound(Side),
    /// Room has no free slot
    Full,
}

/// A single match's state container
pub struct Room {
    pub id: Uuid,
    pub status: RoomStatus,
    pub options: MatchOptions,
    pub players: Vec<Player>,
    pub ball: Ball,
    pub power_ups: Vec<PowerUp>,
    pub winner_id: Option<Uuid>,
    /// Externally persisted match record, if creation succeeded
    pub match_record: Option<Uuid>,
    pub record_requested: bool,
    pub last_tick_at: u64,
    pub previous_snapshot: Option<GameStatus>,
    /// Bumped on every loop start; stale loops compare and exit
    pub generation: u64,
    /// Set once the registry dropped the room
    pub closed: bool,
    pub rng: ChaCha8Rng,
}

impl Room {
    pub fn new(id: Uuid, options: MatchOptions, seed: u64) -> Self {
        Self {
            id,
            status: RoomStatus::Lobby,
            options,
            players: Vec::with_capacity(options.match_type.capacity()),
            ball: Ball::default(),
            power_ups: Vec::new(),
            winner_id: None,
            match_record: None,
            record_requested: false,
            last_tick_at: 0,
            previous_snapshot: None,
            generation: 0,
            closed: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.options.match_type.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity()
    }

    /// Full and every slot bound to a live session
    pub fn is_ready(&self) -> bool {
        self.is_full() && self.players.iter().all(Player::is_connected)
    }

    /// Open for matchmaking scans
    pub fn is_live(&self) -> bool {
        !self.closed && self.status != RoomStatus::Finished
    }

    pub fn has_active_sessions(&self) -> bool {
        self.players.iter().any(Player::is_connected)
    }

    pub fn contains_user(&self, user_id: Uuid) -> bool {
        self.players.iter().any(|p| p.user_id == user_id)
    }

    pub fn player(&self, side: Side) -> Option<&Player> {
        self.players.get(side.index())
    }

    pub fn player_mut(&mut self, side: Side) -> Option<&mut Player> {
        self.players.get_mut(side.index())
    }

    pub fn player_by_user_mut(&mut self, user_id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.user_id == user_id)
    }

    /// Sessions currently bound to either player
    pub fn active_sessions(&self) -> Vec<Uuid> {
        self.players.iter().filter_map(|p| p.session_id).collect()
    }

    /// Seat a user: rebind an existing slot or take the next free side
    pub fn seat(&mut self, user_id: Uuid, session_id: Uuid) -> Seat {
        if let Some(player) = self.player_by_user_mut(user_id) {
            player.session_id = Some(session_id);
            return Seat::Rebound(player.side);
        }
        if self.is_full() {
            return Seat::Full;
        }
        let side = if self.players.is_empty() {
            Side::Left
        } else {
            Side::Right
        };
        self.players.push(Player::new(user_id, session_id, side));
        Seat::Added(side)
    }

    /// Clear a player's session if it is still the given one, releasing any
    /// held key. Returns false when the slot was already rebound elsewhere.
    pub fn release_session(&mut self, session_id: Uuid) -> bool {
        match self
            .players
            .iter_mut()
            .find(|p| p.session_id == Some(session_id))
        {
            Some(player) => {
                player.session_id = None;
                player.paddle.key_released = true;
                player.paddle.vy = 0.0;
                true
            }
            None => false,
        }
    }

    /// Serve from the center toward `toward` with a random vertical component
    pub fn reset_ball(&mut self, toward: Side) {
        let vy = self.rng.gen_range(-1.0..1.0);
        self.ball.x = CENTER_X;
        self.ball.y = CENTER_Y;
        self.ball.vx = match toward {
            Side::Left => -SERVE_SPEED,
            Side::Right => SERVE_SPEED,
        };
        self.ball.vy = vy;
    }
}
