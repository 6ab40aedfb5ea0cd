//! Ball and paddle movement, collisions and goal detection

use crate::ws::protocol::{MoveDirection, Side};

use super::room::{Ball, Paddle, Player, FIELD_HEIGHT, FIELD_WIDTH};

/// Paddle speed applied on key press, px/tick
pub const PADDLE_SPEED: f32 = 5.0;
/// Per-tick speed ramp while a key is held
pub const PADDLE_ACCELERATION: f32 = 1.01;
pub const PADDLE_MAX_SPEED: f32 = 15.0;
/// Offset from the paddle center is divided by this and added to the ball velocity
pub const PADDLE_DEFLECTION: f32 = 10.0;

/// Physics system for updating paddles and the ball
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Velocity for a key press in the given direction
    pub fn paddle_velocity(direction: MoveDirection) -> f32 {
        match direction {
            MoveDirection::Bottom => PADDLE_SPEED,
            MoveDirection::Top => -PADDLE_SPEED,
        }
    }

    /// Integrate every held paddle and clamp all paddles to the field
    pub fn move_paddles(players: &mut [Player]) {
        for player in players.iter_mut() {
            let paddle = &mut player.paddle;
            if !paddle.key_released {
                paddle.y += paddle.vy;
                paddle.vy = (paddle.vy * PADDLE_ACCELERATION)
                    .clamp(-PADDLE_MAX_SPEED, PADDLE_MAX_SPEED);
            }
            Self::clamp_paddle(paddle);
        }
    }

    pub fn clamp_paddle(paddle: &mut Paddle) {
        paddle.y = paddle.y.clamp(0.0, FIELD_HEIGHT);
    }

    /// Advance the ball one tick and bounce it off the top and bottom walls
    pub fn move_ball(ball: &mut Ball) {
        ball.x += ball.vx;
        ball.y += ball.vy;

        if ball.y < 0.0 {
            ball.y = 0.0;
            ball.vy = ball.vy.abs();
        } else if ball.y > FIELD_HEIGHT {
            ball.y = FIELD_HEIGHT;
            ball.vy = -ball.vy.abs();
        }
    }

    /// Bounce the ball off any paddle it overlaps while travelling toward it.
    /// Returns true if a paddle was hit.
    pub fn resolve_paddle_hits(ball: &mut Ball, players: &[Player], now: u64) -> bool {
        let mut hit = false;

        for player in players {
            let paddle = &player.paddle;
            let approaching = match player.side {
                Side::Left => ball.vx < 0.0,
                Side::Right => ball.vx > 0.0,
            };
            if !approaching || !Self::overlaps(ball, paddle) {
                continue;
            }

            ball.vx = -ball.vx + (ball.x - paddle.x) / PADDLE_DEFLECTION;
            ball.vy += (ball.y - paddle.y) / PADDLE_DEFLECTION;
            ball.last_hit_at = Some(now);
            hit = true;
        }

        hit
    }

    fn overlaps(ball: &Ball, paddle: &Paddle) -> bool {
        let half_w = paddle.width / 2.0;
        let half_h = paddle.height / 2.0;
        ball.x >= paddle.x - half_w
            && ball.x <= paddle.x + half_w
            && ball.y >= paddle.y - half_h
            && ball.y <= paddle.y + half_h
    }

    /// Side that scores if the ball left the field
    pub fn check_goal(ball: &Ball) -> Option<Side> {
        if ball.x > FIELD_WIDTH {
            Some(Side::Left)
        } else if ball.x < 0.0 {
            Some(Side::Right)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::{CENTER_Y, LEFT_PADDLE_X, RIGHT_PADDLE_X};
    use uuid::Uuid;

    fn players() -> Vec<Player> {
        vec![
            Player::new(Uuid::new_v4(), Uuid::new_v4(), Side::Left),
            Player::new(Uuid::new_v4(), Uuid::new_v4(), Side::Right),
        ]
    }

    #[test]
    fn held_paddle_moves_and_ramps() {
        let mut players = players();
        players[0].paddle.key_released = false;
        players[0].paddle.vy = PADDLE_SPEED;

        PhysicsSystem::move_paddles(&mut players);

        assert_eq!(players[0].paddle.y, CENTER_Y + PADDLE_SPEED);
        assert!(players[0].paddle.vy > PADDLE_SPEED);
        assert_eq!(players[1].paddle.y, CENTER_Y);
    }

    #[test]
    fn paddle_never_leaves_field() {
        let mut players = players();
        players[0].paddle.key_released = false;
        players[0].paddle.vy = -PADDLE_SPEED;
        players[1].paddle.key_released = false;
        players[1].paddle.vy = PADDLE_SPEED;

        for _ in 0..500 {
            PhysicsSystem::move_paddles(&mut players);
            for p in &players {
                assert!((0.0..=FIELD_HEIGHT).contains(&p.paddle.y));
                assert!(p.paddle.vy.abs() <= PADDLE_MAX_SPEED);
            }
        }
        assert_eq!(players[0].paddle.y, 0.0);
        assert_eq!(players[1].paddle.y, FIELD_HEIGHT);
    }

    #[test]
    fn ball_bounces_off_bottom_wall() {
        let mut ball = Ball {
            x: 400.0,
            y: 599.0,
            vx: 3.0,
            vy: 2.0,
            last_hit_at: None,
        };
        PhysicsSystem::move_ball(&mut ball);

        assert_eq!(ball.y, FIELD_HEIGHT);
        assert_eq!(ball.vy, -2.0);
        assert_eq!(ball.x, 403.0);
    }

    #[test]
    fn paddle_hit_reverses_and_deflects() {
        let players = players();
        let mut ball = Ball {
            x: RIGHT_PADDLE_X,
            y: CENTER_Y + 10.0,
            vx: 3.0,
            vy: 0.0,
            last_hit_at: None,
        };

        assert!(PhysicsSystem::resolve_paddle_hits(&mut ball, &players, 42));
        assert_eq!(ball.vx, -3.0);
        assert_eq!(ball.vy, 1.0);
        assert_eq!(ball.last_hit_at, Some(42));
    }

    #[test]
    fn ball_leaving_paddle_is_not_bounced_twice() {
        let players = players();
        let mut ball = Ball {
            x: LEFT_PADDLE_X,
            y: CENTER_Y,
            vx: 3.0,
            vy: 0.0,
            last_hit_at: None,
        };

        assert!(!PhysicsSystem::resolve_paddle_hits(&mut ball, &players, 1));
        assert_eq!(ball.vx, 3.0);
    }

    #[test]
    fn goal_sides() {
        let mut ball = Ball::default();
        assert_eq!(PhysicsSystem::check_goal(&ball), None);
        ball.x = 805.0;
        assert_eq!(PhysicsSystem::check_goal(&ball), Some(Side::Left));
        ball.x = -1.0;
        assert_eq!(PhysicsSystem::check_goal(&ball), Some(Side::Right));
    }

    #[test]
    fn key_direction_maps_to_velocity() {
        assert_eq!(PhysicsSystem::paddle_velocity(MoveDirection::Bottom), 5.0);
        assert_eq!(PhysicsSystem::paddle_velocity(MoveDirection::Top), -5.0);
    }
}
