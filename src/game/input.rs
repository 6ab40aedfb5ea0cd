//! Paddle input handling

use uuid::Uuid;

use crate::ws::protocol::{KeyEvent, MoveDirection};

use super::physics::PhysicsSystem;
use super::room::Room;

/// A `move` message resolved to a user
#[derive(Debug, Clone, Copy)]
pub struct MoveInput {
    pub user_id: Uuid,
    pub direction: MoveDirection,
    pub event: KeyEvent,
    pub input_seq: u32,
    pub received_at: u64,
}

/// Apply a key transition to the user's paddle.
/// Returns false if the user has no slot in the room; the input is then dropped.
pub fn apply_move(room: &mut Room, input: MoveInput) -> bool {
    let Some(player) = room.player_by_user_mut(input.user_id) else {
        return false;
    };
    let paddle = &mut player.paddle;

    match input.event {
        // Holding the key does not restack the velocity
        KeyEvent::Keydown if paddle.key_released => {
            paddle.key_pressed_at = Some(input.received_at);
            paddle.key_released = false;
            paddle.vy = PhysicsSystem::paddle_velocity(input.direction);
        }
        KeyEvent::Keydown => {}
        KeyEvent::Keyup => {
            paddle.key_released = true;
            paddle.vy = 0.0;
        }
    }
    paddle.last_processed_input = input.input_seq;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::PADDLE_SPEED;
    use crate::game::room::FIELD_HEIGHT;
    use crate::ws::protocol::{MatchOptions, Side};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn input(user_id: Uuid, direction: MoveDirection, event: KeyEvent, seq: u32) -> MoveInput {
        MoveInput {
            user_id,
            direction,
            event,
            input_seq: seq,
            received_at: 100,
        }
    }

    fn room_with(user: Uuid) -> Room {
        let mut room = Room::new(Uuid::new_v4(), MatchOptions::default(), 5);
        room.seat(user, Uuid::new_v4());
        room.seat(Uuid::new_v4(), Uuid::new_v4());
        room
    }

    #[test]
    fn keydown_sets_velocity_once() {
        let user = Uuid::new_v4();
        let mut room = room_with(user);

        assert!(apply_move(&mut room, input(user, MoveDirection::Bottom, KeyEvent::Keydown, 1)));
        room.player_mut(Side::Left).unwrap().paddle.vy = 7.0;
        apply_move(&mut room, input(user, MoveDirection::Top, KeyEvent::Keydown, 2));

        let paddle = &room.player(Side::Left).unwrap().paddle;
        assert_eq!(paddle.vy, 7.0);
        assert!(!paddle.key_released);
        assert_eq!(paddle.key_pressed_at, Some(100));
        assert_eq!(paddle.last_processed_input, 2);
    }

    #[test]
    fn keyup_releases_and_stops() {
        let user = Uuid::new_v4();
        let mut room = room_with(user);
        apply_move(&mut room, input(user, MoveDirection::Top, KeyEvent::Keydown, 1));
        assert_eq!(room.player(Side::Left).unwrap().paddle.vy, -PADDLE_SPEED);

        apply_move(&mut room, input(user, MoveDirection::Top, KeyEvent::Keyup, 2));

        let paddle = &room.player(Side::Left).unwrap().paddle;
        assert_eq!(paddle.vy, 0.0);
        assert!(paddle.key_released);
        assert_eq!(paddle.last_processed_input, 2);
    }

    #[test]
    fn unknown_user_is_dropped() {
        let mut room = room_with(Uuid::new_v4());
        assert!(!apply_move(
            &mut room,
            input(Uuid::new_v4(), MoveDirection::Top, KeyEvent::Keydown, 1)
        ));
    }

    #[test]
    fn adversarial_toggling_keeps_paddle_in_field() {
        let user = Uuid::new_v4();
        let mut room = room_with(user);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for seq in 0..5_000 {
            let direction = if rng.gen_bool(0.5) {
                MoveDirection::Top
            } else {
                MoveDirection::Bottom
            };
            let event = if rng.gen_bool(0.7) {
                KeyEvent::Keydown
            } else {
                KeyEvent::Keyup
            };
            apply_move(&mut room, input(user, direction, event, seq));
            PhysicsSystem::move_paddles(&mut room.players);

            let y = room.player(Side::Left).unwrap().paddle.y;
            assert!((0.0..=FIELD_HEIGHT).contains(&y));
        }
    }

    #[test]
    fn key_held_across_disconnect_does_not_block_steering() {
        let user = Uuid::new_v4();
        let mut room = Room::new(Uuid::new_v4(), MatchOptions::default(), 5);
        let session = Uuid::new_v4();
        room.seat(user, session);
        room.seat(Uuid::new_v4(), Uuid::new_v4());
        apply_move(&mut room, input(user, MoveDirection::Bottom, KeyEvent::Keydown, 1));
        PhysicsSystem::move_paddles(&mut room.players);

        assert!(room.release_session(session));
        let paddle = &room.player(Side::Left).unwrap().paddle;
        assert!(paddle.key_released);
        assert_eq!(paddle.vy, 0.0);

        room.seat(user, Uuid::new_v4());
        apply_move(&mut room, input(user, MoveDirection::Top, KeyEvent::Keydown, 1));
        assert_eq!(room.player(Side::Left).unwrap().paddle.vy, -PADDLE_SPEED);
    }
}
