//! Match record persistence

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::ws::protocol::MatchType;

use super::supabase::SupabaseClient;
use super::StoreError;

/// External store for match records and per-player scores.
/// Calls are fire-and-forget from the room loop's point of view.
pub trait MatchRecordStore: Send + Sync {
    /// Create a record for a starting match, returning its id
    fn create(
        &self,
        match_type: MatchType,
        user_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, Result<Uuid, StoreError>>;

    /// Store a player's current score for a match
    fn update_score(
        &self,
        record_id: Uuid,
        user_id: Uuid,
        score: u32,
    ) -> BoxFuture<'static, Result<(), StoreError>>;
}

/// Match row as stored in the `matches` table
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct NewMatchRecord {
    match_type: MatchType,
    user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct PlayerScoreRow {
    match_id: Uuid,
    user_id: Uuid,
    score: u32,
}

/// Supabase-backed match store
#[derive(Clone)]
pub struct SupabaseMatchStore {
    client: SupabaseClient,
}

impl SupabaseMatchStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl MatchRecordStore for SupabaseMatchStore {
    fn create(
        &self,
        match_type: MatchType,
        user_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, Result<Uuid, StoreError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let record: MatchRecord = client
                .insert("matches", &NewMatchRecord { match_type, user_ids })
                .await?;
            debug!(record_id = %record.id, created_at = %record.created_at, "Match record created");
            Ok(record.id)
        })
    }

    fn update_score(
        &self,
        record_id: Uuid,
        user_id: Uuid,
        score: u32,
    ) -> BoxFuture<'static, Result<(), StoreError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let row = PlayerScoreRow {
                match_id: record_id,
                user_id,
                score,
            };
            client
                .upsert("player_scores", &row, "match_id,user_id")
                .await?;
            Ok(())
        })
    }
}
