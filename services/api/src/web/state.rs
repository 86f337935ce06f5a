//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::error::ApiError;
use mentor_match_core::domain::User;
use mentor_match_core::ports::{DatabaseService, PortResultExt};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Holds no mutable business data of its own; everything lives in the store.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Loads a user, treating a missing record as `None`.
    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.db.get_user_by_id(user_id).await.optional()?)
    }

    /// Loads every distinct user in `ids`. Missing users are left out of the map.
    pub async fn users_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>, ApiError> {
        let mut users = HashMap::new();
        for &id in ids {
            if users.contains_key(&id) {
                continue;
            }
            if let Some(user) = self.find_user(id).await? {
                users.insert(id, user);
            }
        }
        Ok(users)
    }
}
