//! Snapshot building for network transmission

use crate::ws::protocol::{BallState, GameStatus, PaddleState, PlayerStatus, PowerUpState};

use super::room::Room;

/// Builds wire snapshots from room state
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Full snapshot of the room as of its last tick
    pub fn build(room: &Room) -> GameStatus {
        let players = room
            .players
            .iter()
            .map(|p| PlayerStatus {
                user_id: p.user_id,
                side: p.side,
                score: p.score,
                connected: p.is_connected(),
                last_processed_input: p.paddle.last_processed_input,
                paddle: PaddleState {
                    x: p.paddle.x,
                    y: p.paddle.y,
                    vy: p.paddle.vy,
                    width: p.paddle.width,
                    height: p.paddle.height,
                    color: p.paddle.color.to_string(),
                },
            })
            .collect();

        let power_ups = room
            .power_ups
            .iter()
            .map(|p| PowerUpState {
                x: p.x,
                y: p.y,
                kind: p.kind,
                applied_to: p.applied_to,
            })
            .collect();

        GameStatus {
            status: room.status,
            ball: BallState {
                x: room.ball.x,
                y: room.ball.y,
                vx: room.ball.vx,
                vy: room.ball.vy,
                last_hit_at: room.ball.last_hit_at,
            },
            players,
            power_ups,
            server_time: room.last_tick_at,
        }
    }

    /// Build and remember the snapshot as the room's latest broadcast
    pub fn build_and_record(room: &mut Room) -> GameStatus {
        let snapshot = Self::build(room);
        room.previous_snapshot = Some(snapshot.clone());
        snapshot
    }
}
