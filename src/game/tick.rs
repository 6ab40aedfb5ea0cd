//! Per-room fixed-rate simulation driver

use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::store::{announce_presence, Presence};
use crate::util::time::{tick_period, unix_millis};
use crate::ws::gateway::RoomBroadcast;
use crate::ws::protocol::{RoomStatus, ServerMsg, Side};

use super::physics::PhysicsSystem;
use super::powerups::{Expiry, PowerUpSystem};
use super::registry::RoomHandle;
use super::room::Room;
use super::score::{GoalEvent, ScoreTracker};
use super::snapshot::SnapshotBuilder;
use super::GameContext;

/// Advance a room by one tick. Velocities are per tick, so every tick uses
/// the same delta regardless of scheduling jitter.
pub fn step(room: &mut Room, now: u64, spawn_chance: f64) -> Option<GoalEvent> {
    room.last_tick_at = now;
    PhysicsSystem::move_paddles(&mut room.players);

    if room.status != RoomStatus::Started {
        return None;
    }

    PhysicsSystem::move_ball(&mut room.ball);
    PhysicsSystem::resolve_paddle_hits(&mut room.ball, &room.players, now);
    let goal = PhysicsSystem::check_goal(&room.ball)
        .and_then(|scorer| ScoreTracker::on_goal(room, scorer, now));

    if room.options.power_ups_enabled && room.status == RoomStatus::Started {
        PowerUpSystem::update(room, now, spawn_chance);
    }

    goal
}

/// The authoritative loop of one room
pub struct GameLoop {
    ctx: GameContext,
    room_id: Uuid,
    handle: RoomHandle,
    generation: u64,
}

impl GameLoop {
    /// Move a ready lobby to Started, announce it and spawn its loop.
    /// Returns false when the room cannot start (not ready, closed, running or finished).
    pub fn start(ctx: &GameContext, handle: RoomHandle) -> bool {
        let (room_id, generation, starting, record_request, user_ids) = {
            let mut room = handle.lock();
            if room.closed || room.status != RoomStatus::Lobby || !room.is_ready() {
                return false;
            }

            room.status = RoomStatus::Started;
            room.generation += 1;
            room.last_tick_at = unix_millis();

            let user_ids: Vec<Uuid> = room.players.iter().map(|p| p.user_id).collect();
            let snapshot = SnapshotBuilder::build_and_record(&mut room);
            let starting = RoomBroadcast::lifecycle(
                &room,
                ServerMsg::GameStarting {
                    room_id: room.id,
                    state: snapshot,
                    countdown: ctx.config.countdown_secs,
                },
            );

            let record_request = if room.match_record.is_none() && !room.record_requested {
                room.record_requested = true;
                Some(room.options.match_type)
            } else {
                None
            };

            (room.id, room.generation, starting, record_request, user_ids)
        };

        info!(room_id = %room_id, generation, "Match starting");
        starting.send(ctx.gateway.as_ref());

        if let Some(match_type) = record_request {
            let fut = ctx.records.create(match_type, user_ids.clone());
            let handle = handle.clone();
            tokio::spawn(async move {
                match fut.await {
                    Ok(record_id) => {
                        handle.lock().match_record = Some(record_id);
                        debug!(room_id = %room_id, record_id = %record_id, "Match record attached");
                    }
                    Err(e) => {
                        error!(room_id = %room_id, error = %e, "Failed to create match record");
                    }
                }
            });
        }

        for user_id in user_ids {
            announce_presence(&ctx.users, user_id, Presence::InGame);
        }

        let game_loop = GameLoop {
            ctx: ctx.clone(),
            room_id,
            handle,
            generation,
        };
        tokio::spawn(game_loop.run());
        true
    }

    fn owns(&self, room: &Room) -> bool {
        !room.closed && room.generation == self.generation
    }

    /// Run the authoritative tick loop
    pub async fn run(self) {
        sleep(self.ctx.config.start_delay).await;

        {
            let mut room = self.handle.lock();
            if !self.owns(&room) || room.status != RoomStatus::Started {
                debug!(room_id = %self.room_id, "Room changed during countdown");
                return;
            }
            // A resumed match may still carry effects from before the pause
            PowerUpSystem::expire(&mut room, unix_millis(), Expiry::Force);
            room.reset_ball(Side::Right);
        }

        let mut ticker = interval(tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let final_status = loop {
            ticker.tick().await;

            let (broadcast, goal) = {
                let mut room = self.handle.lock();
                if !self.owns(&room) {
                    debug!(room_id = %self.room_id, "Loop superseded or room closed");
                    return;
                }
                if room.status != RoomStatus::Started {
                    break room.status;
                }
                let goal = step(&mut room, unix_millis(), self.ctx.config.power_up_spawn_chance);
                (RoomBroadcast::status(&mut room), goal)
            };

            broadcast.send(self.ctx.gateway.as_ref());
            if let Some(goal) = goal {
                ScoreTracker::dispatch(&goal, &self.ctx.records, &self.ctx.users);
            }
        };

        match final_status {
            RoomStatus::Finished => self.finish().await,
            _ => info!(room_id = %self.room_id, "Match paused, waiting for players"),
        }
    }

    /// Grace period, `game_ended`, then teardown
    async fn finish(self) {
        sleep(self.ctx.config.end_grace).await;

        let (ended, user_ids) = {
            let mut room = self.handle.lock();
            if !self.owns(&room) {
                return;
            }
            let ended = RoomBroadcast::lifecycle(
                &room,
                ServerMsg::GameEnded {
                    winner_id: room.winner_id,
                },
            );
            let user_ids: Vec<Uuid> = room.players.iter().map(|p| p.user_id).collect();
            self.ctx.registry.remove_locked(&mut room);
            (ended, user_ids)
        };

        ended.send(self.ctx.gateway.as_ref());
        for user_id in user_ids {
            announce_presence(&self.ctx.users, user_id, Presence::Online);
        }
        info!(room_id = %self.room_id, "Match ended");
    }
}
