//! User directory: ratings and presence

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::supabase::SupabaseClient;
use super::StoreError;

/// Presence shown to other users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    InGame,
    Offline,
}

/// External user directory
pub trait UserDirectory: Send + Sync {
    /// Recompute both players' ratings after a finished match
    fn update_rating(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        winner_id: Uuid,
    ) -> BoxFuture<'static, Result<(), StoreError>>;

    /// Update a user's presence status
    fn set_presence(
        &self,
        user_id: Uuid,
        presence: Presence,
    ) -> BoxFuture<'static, Result<(), StoreError>>;
}

#[derive(Debug, Serialize)]
struct RatingArgs {
    user_a: Uuid,
    user_b: Uuid,
    winner_id: Uuid,
}

#[derive(Debug, Serialize)]
struct PresenceUpdate {
    status: Presence,
}

/// Supabase-backed user directory (`profiles` table, `update_rating` RPC)
#[derive(Clone)]
pub struct SupabaseUserDirectory {
    client: SupabaseClient,
}

impl SupabaseUserDirectory {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl UserDirectory for SupabaseUserDirectory {
    fn update_rating(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        winner_id: Uuid,
    ) -> BoxFuture<'static, Result<(), StoreError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let args = RatingArgs {
                user_a,
                user_b,
                winner_id,
            };
            client.rpc("update_rating", &args).await?;
            Ok(())
        })
    }

    fn set_presence(
        &self,
        user_id: Uuid,
        presence: Presence,
    ) -> BoxFuture<'static, Result<(), StoreError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let query = format!("id=eq.{}", user_id);
            client
                .update("profiles", &query, &PresenceUpdate { status: presence })
                .await?;
            Ok(())
        })
    }
}

/// Fire-and-forget presence update
pub fn announce_presence(users: &Arc<dyn UserDirectory>, user_id: Uuid, presence: Presence) {
    let fut = users.set_presence(user_id, presence);
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            warn!(user_id = %user_id, presence = ?presence, error = %e, "Failed to update presence");
        }
    });
}
