//! Power-up lifecycle: spawn, pickup, expiry

use rand::Rng;
use tracing::debug;

use crate::util::time::elapsed_ms;
use crate::ws::protocol::{AppliedTo, PowerUpKind, Side};

use super::room::{Ball, PowerUp, Room, PADDLE_HEIGHT, SERVE_SPEED};

pub const MAX_POWER_UPS: usize = 4;
/// Ball-to-power-up distance that triggers a pickup
pub const PICKUP_RADIUS: f32 = 30.0;
/// No spawn until the ball has been in play this long since the last hit
pub const SPAWN_COOLDOWN_MS: u64 = 1000;
pub const DEATH_MIN_HEIGHT: f32 = 15.0;
pub const MIN_DURATION_SECS: f32 = 4.0;
pub const MAX_DURATION_SECS: f32 = 8.0;

/// Mercy flag for expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Revert only applied power-ups whose duration elapsed
    Natural,
    /// Revert everything now and clear the list
    Force,
}

pub struct PowerUpSystem;

impl PowerUpSystem {
    /// Per-tick lifecycle for a running room
    pub fn update(room: &mut Room, now: u64, spawn_chance: f64) {
        Self::maybe_spawn(room, now, spawn_chance);
        Self::collect_pickups(room, now);
        Self::expire(room, now, Expiry::Natural);
    }

    /// Roll for a new power-up. Returns the spawned kind, if any.
    pub fn maybe_spawn(room: &mut Room, now: u64, spawn_chance: f64) -> Option<PowerUpKind> {
        if room.power_ups.len() >= MAX_POWER_UPS {
            return None;
        }
        // The ball has to be in play: never before the first hit
        let last_hit = room.ball.last_hit_at?;
        if elapsed_ms(now, last_hit) < SPAWN_COOLDOWN_MS {
            return None;
        }
        if !room.rng.gen_bool(spawn_chance.clamp(0.0, 1.0)) {
            return None;
        }

        let kind = PowerUpKind::ALL[room.rng.gen_range(0..PowerUpKind::ALL.len())];
        if room.power_ups.iter().any(|p| p.kind == kind) {
            return None;
        }

        let power_up = PowerUp {
            x: room.rng.gen_range(50.0..750.0),
            y: room.rng.gen_range(50.0..550.0),
            kind,
            duration_secs: room.rng.gen_range(MIN_DURATION_SECS..MAX_DURATION_SECS),
            applied_at: None,
            applied_to: None,
        };
        debug!(room_id = %room.id, kind = ?kind, x = power_up.x, y = power_up.y, "Power-up spawned");
        room.power_ups.push(power_up);
        Some(kind)
    }

    /// Apply every pending power-up the ball is touching. Returns how many were applied.
    pub fn collect_pickups(room: &mut Room, now: u64) -> usize {
        let mut applied = 0;
        for idx in 0..room.power_ups.len() {
            let power_up = &room.power_ups[idx];
            if power_up.is_applied() {
                continue;
            }
            let dx = room.ball.x - power_up.x;
            let dy = room.ball.y - power_up.y;
            if (dx * dx + dy * dy).sqrt() < PICKUP_RADIUS {
                Self::apply(room, idx, now);
                applied += 1;
            }
        }
        applied
    }

    /// Side an effect lands on: the opposite of the ball's horizontal direction
    pub fn receiving_side(ball: &Ball) -> Side {
        if ball.vx > 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn apply(room: &mut Room, idx: usize, now: u64) {
        let side = Self::receiving_side(&room.ball);
        let kind = room.power_ups[idx].kind;

        let applied_to = match kind {
            PowerUpKind::Speed => {
                room.ball.vx *= 2.0;
                room.ball.vy *= 2.0;
                AppliedTo::Ball
            }
            PowerUpKind::Sticky => {
                room.ball.vx = 0.0;
                room.ball.vy = 0.0;
                AppliedTo::Ball
            }
            PowerUpKind::Size => {
                if let Some(player) = room.player_mut(side) {
                    player.paddle.height *= 2.0;
                }
                side.into()
            }
            PowerUpKind::Death => {
                if let Some(player) = room.player_mut(side) {
                    player.paddle.height = (player.paddle.height / 2.0).max(DEATH_MIN_HEIGHT);
                }
                side.into()
            }
        };

        let power_up = &mut room.power_ups[idx];
        power_up.applied_at = Some(now);
        power_up.applied_to = Some(applied_to);
        debug!(room_id = %room.id, kind = ?kind, applied_to = ?applied_to, "Power-up applied");
    }

    /// Revert and drop expired power-ups. Returns how many were removed.
    pub fn expire(room: &mut Room, now: u64, mode: Expiry) -> usize {
        let power_ups = std::mem::take(&mut room.power_ups);
        let before = power_ups.len();

        for power_up in power_ups {
            let expired = match (mode, power_up.applied_at) {
                (Expiry::Force, _) => true,
                (Expiry::Natural, Some(at)) => {
                    elapsed_ms(now, at) as f32 > power_up.duration_secs * 1000.0
                }
                (Expiry::Natural, None) => false,
            };

            if expired {
                Self::revert(room, &power_up);
            } else {
                room.power_ups.push(power_up);
            }
        }

        before - room.power_ups.len()
    }

    fn revert(room: &mut Room, power_up: &PowerUp) {
        let Some(applied_to) = power_up.applied_to else {
            return;
        };

        match power_up.kind {
            PowerUpKind::Speed => {
                room.ball.vx /= 2.0;
                room.ball.vy /= 2.0;
            }
            PowerUpKind::Sticky => {
                let sign = if room.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                room.ball.vx = sign * room.rng.gen_range(SERVE_SPEED..SERVE_SPEED * 3.0);
                room.ball.vy = room.rng.gen_range(-1.0..1.0);
            }
            PowerUpKind::Size => {
                if let Some(player) = side_of(applied_to).and_then(|s| room.player_mut(s)) {
                    player.paddle.height /= 2.0;
                }
            }
            PowerUpKind::Death => {
                // Reset rather than double back so repeated pickups cannot compound
                if let Some(player) = side_of(applied_to).and_then(|s| room.player_mut(s)) {
                    player.paddle.height = PADDLE_HEIGHT;
                }
            }
        }
    }
}

fn side_of(applied_to: AppliedTo) -> Option<Side> {
    match applied_to {
        AppliedTo::Left => Some(Side::Left),
        AppliedTo::Right => Some(Side::Right),
        AppliedTo::Ball => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{MatchOptions, RoomStatus};
    use uuid::Uuid;

    fn running_room() -> Room {
        let mut room = Room::new(Uuid::new_v4(), MatchOptions::default(), 99);
        room.seat(Uuid::new_v4(), Uuid::new_v4());
        room.seat(Uuid::new_v4(), Uuid::new_v4());
        room.status = RoomStatus::Started;
        room
    }

    fn place_near_ball(room: &mut Room, kind: PowerUpKind, dx: f32) {
        let (x, y) = (room.ball.x + dx, room.ball.y);
        place(room, kind, x, y);
    }

    fn place(room: &mut Room, kind: PowerUpKind, x: f32, y: f32) {
        room.power_ups.push(PowerUp {
            x,
            y,
            kind,
            duration_secs: 5.0,
            applied_at: None,
            applied_to: None,
        });
    }

    #[test]
    fn speed_doubles_then_restores() {
        let mut room = running_room();
        room.ball.vx = 3.0;
        room.ball.vy = 0.5;
        place_near_ball(&mut room, PowerUpKind::Speed, 10.0);

        assert_eq!(PowerUpSystem::collect_pickups(&mut room, 1_000), 1);
        assert_eq!(room.ball.vx, 6.0);
        assert_eq!(room.power_ups[0].applied_to, Some(AppliedTo::Ball));

        // Not yet elapsed
        assert_eq!(PowerUpSystem::expire(&mut room, 5_000, Expiry::Natural), 0);
        assert_eq!(PowerUpSystem::expire(&mut room, 6_001, Expiry::Natural), 1);
        assert_eq!(room.ball.vx, 3.0);
        assert_eq!(room.ball.vy, 0.5);
        assert!(room.power_ups.is_empty());
    }

    #[test]
    fn size_lands_on_side_opposite_ball_direction() {
        let mut room = running_room();
        room.ball.vx = 3.0;
        place_near_ball(&mut room, PowerUpKind::Size, 0.0);

        PowerUpSystem::collect_pickups(&mut room, 10);

        assert_eq!(room.power_ups[0].applied_to, Some(AppliedTo::Left));
        assert_eq!(room.player(Side::Left).unwrap().paddle.height, PADDLE_HEIGHT * 2.0);
        assert_eq!(room.player(Side::Right).unwrap().paddle.height, PADDLE_HEIGHT);
    }

    #[test]
    fn repeated_death_resets_to_base_height() {
        let mut room = running_room();
        room.ball.vx = -3.0;
        place_near_ball(&mut room, PowerUpKind::Death, 0.0);
        PowerUpSystem::collect_pickups(&mut room, 10);
        let first = room.player(Side::Right).unwrap().paddle.height;
        assert_eq!(first, PADDLE_HEIGHT / 2.0);

        PowerUpSystem::expire(&mut room, 0, Expiry::Force);
        place_near_ball(&mut room, PowerUpKind::Death, 0.0);
        PowerUpSystem::collect_pickups(&mut room, 20);
        room.player_mut(Side::Right).unwrap().paddle.height = DEATH_MIN_HEIGHT;

        PowerUpSystem::expire(&mut room, 20_000, Expiry::Natural);
        assert_eq!(room.player(Side::Right).unwrap().paddle.height, PADDLE_HEIGHT);
    }

    #[test]
    fn death_never_shrinks_below_minimum() {
        let mut room = running_room();
        room.player_mut(Side::Right).unwrap().paddle.height = 20.0;
        room.ball.vx = -1.0;
        place_near_ball(&mut room, PowerUpKind::Death, 0.0);

        PowerUpSystem::collect_pickups(&mut room, 10);
        assert_eq!(room.player(Side::Right).unwrap().paddle.height, DEATH_MIN_HEIGHT);
    }

    #[test]
    fn sticky_freezes_and_expiry_relaunches() {
        let mut room = running_room();
        room.ball.vx = 4.0;
        room.ball.vy = 1.0;
        place_near_ball(&mut room, PowerUpKind::Sticky, 0.0);

        PowerUpSystem::collect_pickups(&mut room, 10);
        assert_eq!((room.ball.vx, room.ball.vy), (0.0, 0.0));

        PowerUpSystem::expire(&mut room, 10_000, Expiry::Natural);
        assert!(room.ball.vx.abs() >= SERVE_SPEED);
    }

    #[test]
    fn force_clears_pending_and_applied() {
        let mut room = running_room();
        room.ball.vx = 3.0;
        place_near_ball(&mut room, PowerUpKind::Speed, 0.0);
        place(&mut room, PowerUpKind::Size, 100.0, 100.0);
        PowerUpSystem::collect_pickups(&mut room, 10);

        assert_eq!(PowerUpSystem::expire(&mut room, 11, Expiry::Force), 2);
        assert!(room.power_ups.is_empty());
        assert_eq!(room.ball.vx, 3.0);
        assert_eq!(room.player(Side::Left).unwrap().paddle.height, PADDLE_HEIGHT);
    }

    #[test]
    fn far_power_up_is_not_picked() {
        let mut room = running_room();
        place_near_ball(&mut room, PowerUpKind::Speed, 31.0);
        assert_eq!(PowerUpSystem::collect_pickups(&mut room, 10), 0);
    }

    #[test]
    fn no_spawn_before_first_hit_or_within_cooldown() {
        let mut room = running_room();
        assert_eq!(PowerUpSystem::maybe_spawn(&mut room, 10_000, 1.0), None);

        room.ball.last_hit_at = Some(9_500);
        assert_eq!(PowerUpSystem::maybe_spawn(&mut room, 10_000, 1.0), None);
    }

    #[test]
    fn spawns_stay_bounded_and_distinct() {
        let mut room = running_room();
        room.ball.last_hit_at = Some(0);

        for tick in 0..1_000 {
            PowerUpSystem::maybe_spawn(&mut room, 5_000 + tick, 1.0);
            assert!(room.power_ups.len() <= MAX_POWER_UPS);
        }
        let mut kinds: Vec<_> = room.power_ups.iter().map(|p| p.kind).collect();
        kinds.sort_by_key(|k| *k as u8);
        kinds.dedup();
        assert_eq!(kinds.len(), room.power_ups.len());
        assert_eq!(room.power_ups.len(), MAX_POWER_UPS);

        for p in &room.power_ups {
            assert!((50.0..750.0).contains(&p.x));
            assert!((50.0..550.0).contains(&p.y));
            assert!((MIN_DURATION_SECS..MAX_DURATION_SECS).contains(&p.duration_secs));
        }
    }
}
