//! Shared fixtures for the handler tests.

use mentor_match_core::domain::{NewUser, Role, User};
use mentor_match_core::Caller;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::adapters::MemoryAdapter;
use crate::config::{Config, MEMORY_DATABASE_URL};
use crate::web::state::AppState;

pub const ADMIN_KEY: &str = "let-me-in";

pub fn test_config() -> Config {
    Config {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: MEMORY_DATABASE_URL.to_string(),
        db_max_connections: 1,
        log_level: tracing::Level::DEBUG,
        jwt_secret: "test-secret".to_string(),
        token_ttl: chrono::Duration::hours(24),
        admin_signup_key: Some(ADMIN_KEY.to_string()),
        cors_allowed_origin: "http://localhost:5173".to_string(),
    }
}

pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(MemoryAdapter::new()),
        Arc::new(test_config()),
    ))
}

/// Creates a user straight through the store, skipping password hashing.
pub async fn sign_up(state: &Arc<AppState>, name: &str, email: &str, role: Role) -> (Caller, User) {
    let user = state
        .db
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            hashed_password: "not-a-real-hash".to_string(),
            role,
        })
        .await
        .expect("fixture user is created");
    (Caller::new(user.id, role), user)
}
