//! Persistence collaborators: match records and the user directory

pub mod matches;
pub mod supabase;
pub mod users;

pub use matches::{MatchRecordStore, SupabaseMatchStore};
pub use supabase::{SupabaseClient, SupabaseError};
pub use users::{announce_presence, Presence, SupabaseUserDirectory, UserDirectory};

/// Errors surfaced by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
pub(crate) mod testing {
    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use uuid::Uuid;

    use super::{MatchRecordStore, Presence, StoreError, UserDirectory};
    use crate::ws::protocol::MatchType;

    /// Match store keeping everything in memory; `failing` rejects every call
    #[derive(Default)]
    pub struct InMemoryMatchStore {
        pub failing: bool,
        pub created: Mutex<Vec<(Uuid, MatchType, Vec<Uuid>)>>,
        pub scores: Mutex<Vec<(Uuid, Uuid, u32)>>,
    }

    impl InMemoryMatchStore {
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }
    }

    impl MatchRecordStore for InMemoryMatchStore {
        fn create(
            &self,
            match_type: MatchType,
            user_ids: Vec<Uuid>,
        ) -> BoxFuture<'static, Result<Uuid, StoreError>> {
            let result = if self.failing {
                Err(StoreError::Unavailable("create refused".into()))
            } else {
                let id = Uuid::new_v4();
                self.created.lock().push((id, match_type, user_ids));
                Ok(id)
            };
            Box::pin(async move { result })
        }

        fn update_score(
            &self,
            record_id: Uuid,
            user_id: Uuid,
            score: u32,
        ) -> BoxFuture<'static, Result<(), StoreError>> {
            let result = if self.failing {
                Err(StoreError::Unavailable("update refused".into()))
            } else {
                self.scores.lock().push((record_id, user_id, score));
                Ok(())
            };
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    pub struct InMemoryUserDirectory {
        pub ratings: Mutex<Vec<(Uuid, Uuid, Uuid)>>,
        pub presence: Mutex<Vec<(Uuid, Presence)>>,
    }

    impl UserDirectory for InMemoryUserDirectory {
        fn update_rating(
            &self,
            user_a: Uuid,
            user_b: Uuid,
            winner_id: Uuid,
        ) -> BoxFuture<'static, Result<(), StoreError>> {
            self.ratings.lock().push((user_a, user_b, winner_id));
            Box::pin(async { Ok(()) })
        }

        fn set_presence(
            &self,
            user_id: Uuid,
            presence: Presence,
        ) -> BoxFuture<'static, Result<(), StoreError>> {
            self.presence.lock().push((user_id, presence));
            Box::pin(async { Ok(()) })
        }
    }
}
