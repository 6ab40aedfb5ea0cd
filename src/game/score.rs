//! Goal accounting, win condition and persistence triggers

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::store::{MatchRecordStore, UserDirectory};
use crate::ws::protocol::{RoomStatus, Side};

use super::powerups::{Expiry, PowerUpSystem};
use super::room::{Room, WINNING_SCORE};

/// Final result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub left: Uuid,
    pub right: Uuid,
    pub winner: Uuid,
}

/// What a goal changed, for work done outside the room lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalEvent {
    pub room_id: Uuid,
    pub scorer: Side,
    pub user_id: Uuid,
    pub score: u32,
    pub match_record: Option<Uuid>,
    pub result: Option<MatchResult>,
}

pub struct ScoreTracker;

impl ScoreTracker {
    /// Credit a goal to `scorer` and serve toward the side that conceded
    pub fn on_goal(room: &mut Room, scorer: Side, now: u64) -> Option<GoalEvent> {
        PowerUpSystem::expire(room, now, Expiry::Force);
        room.ball.last_hit_at = Some(now);

        let event = match room.player_mut(scorer) {
            Some(player) => {
                player.score += 1;
                Some((player.user_id, player.score))
            }
            None => None,
        }
        .map(|(user_id, score)| GoalEvent {
            room_id: room.id,
            scorer,
            user_id,
            score,
            match_record: room.match_record,
            result: Self::check_win(room),
        });

        room.reset_ball(scorer.opposite());
        event
    }

    /// Finish the room once a player reaches the winning score
    fn check_win(room: &mut Room) -> Option<MatchResult> {
        let winner = room
            .players
            .iter()
            .find(|p| p.score >= WINNING_SCORE)
            .map(|p| p.user_id)?;
        let left = room.player(Side::Left)?.user_id;
        let right = room.player(Side::Right)?.user_id;

        room.winner_id = Some(winner);
        room.status = RoomStatus::Finished;
        info!(room_id = %room.id, winner_id = %winner, "Match finished");

        Some(MatchResult {
            left,
            right,
            winner,
        })
    }

    /// Fire-and-forget persistence for a goal. Failures are logged, never retried.
    pub fn dispatch(
        event: &GoalEvent,
        records: &Arc<dyn MatchRecordStore>,
        users: &Arc<dyn UserDirectory>,
    ) {
        match event.match_record {
            Some(record_id) => {
                let fut = records.update_score(record_id, event.user_id, event.score);
                let room_id = event.room_id;
                let user_id = event.user_id;
                tokio::spawn(async move {
                    if let Err(e) = fut.await {
                        error!(room_id = %room_id, user_id = %user_id, error = %e, "Failed to persist score");
                    }
                });
            }
            None => {
                warn!(
                    room_id = %event.room_id,
                    user_id = %event.user_id,
                    score = event.score,
                    "No match record, score not persisted"
                );
            }
        }

        if let Some(result) = event.result {
            let fut = users.update_rating(result.left, result.right, result.winner);
            let room_id = event.room_id;
            tokio::spawn(async move {
                if let Err(e) = fut.await {
                    error!(room_id = %room_id, error = %e, "Failed to update ratings");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::{PowerUp, CENTER_X, CENTER_Y, SERVE_SPEED};
    use crate::ws::protocol::{MatchOptions, PowerUpKind};

    fn running_room() -> Room {
        let mut room = Room::new(Uuid::new_v4(), MatchOptions::default(), 3);
        room.seat(Uuid::new_v4(), Uuid::new_v4());
        room.seat(Uuid::new_v4(), Uuid::new_v4());
        room.status = RoomStatus::Started;
        room
    }

    #[test]
    fn goal_increments_and_resets_ball() {
        let mut room = running_room();
        room.ball.x = 805.0;
        room.power_ups.push(PowerUp {
            x: 100.0,
            y: 100.0,
            kind: PowerUpKind::Speed,
            duration_secs: 5.0,
            applied_at: None,
            applied_to: None,
        });

        let event = ScoreTracker::on_goal(&mut room, Side::Left, 500).unwrap();

        assert_eq!(event.score, 1);
        assert_eq!(event.scorer, Side::Left);
        assert_eq!(event.result, None);
        assert_eq!(room.player(Side::Left).unwrap().score, 1);
        assert_eq!(room.player(Side::Right).unwrap().score, 0);
        assert_eq!((room.ball.x, room.ball.y), (CENTER_X, CENTER_Y));
        // Serve goes to the side that conceded
        assert_eq!(room.ball.vx, SERVE_SPEED);
        assert_eq!(room.ball.last_hit_at, Some(500));
        assert!(room.power_ups.is_empty());
        assert_eq!(room.status, RoomStatus::Started);
    }

    #[test]
    fn fifth_goal_finishes_match() {
        let mut room = running_room();
        room.player_mut(Side::Right).unwrap().score = 4;
        room.player_mut(Side::Left).unwrap().score = 2;
        let right_user = room.player(Side::Right).unwrap().user_id;
        let left_user = room.player(Side::Left).unwrap().user_id;

        let event = ScoreTracker::on_goal(&mut room, Side::Right, 10).unwrap();

        assert_eq!(event.score, WINNING_SCORE);
        assert_eq!(
            event.result,
            Some(MatchResult {
                left: left_user,
                right: right_user,
                winner: right_user,
            })
        );
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.winner_id, Some(right_user));
        assert_eq!(room.ball.vx, -SERVE_SPEED);
    }

    #[tokio::test]
    async fn rating_update_survives_score_store_failure() {
        use crate::game::testing::wait_until;
        use crate::store::testing::{InMemoryMatchStore, InMemoryUserDirectory};

        let records: Arc<dyn MatchRecordStore> = Arc::new(InMemoryMatchStore::failing());
        let directory = Arc::new(InMemoryUserDirectory::default());
        let users: Arc<dyn UserDirectory> = directory.clone();
        let (left, right) = (Uuid::new_v4(), Uuid::new_v4());
        let event = GoalEvent {
            room_id: Uuid::new_v4(),
            scorer: Side::Left,
            user_id: left,
            score: WINNING_SCORE,
            match_record: Some(Uuid::new_v4()),
            result: Some(MatchResult {
                left,
                right,
                winner: left,
            }),
        };

        ScoreTracker::dispatch(&event, &records, &users);

        assert!(wait_until(|| directory.ratings.lock().len() == 1).await);
        assert_eq!(directory.ratings.lock()[0], (left, right, left));
        tokio_test::assert_err!(records.update_score(Uuid::new_v4(), left, 1).await);
    }
}
