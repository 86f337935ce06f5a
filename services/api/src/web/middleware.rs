//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use mentor_match_core::Caller;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::token::{bearer_token, verify_token};

/// Resolves the caller named by the request's bearer token.
pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<Caller, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthenticated("No token, authorization denied".to_string()))?;

    verify_token(config, token)
}

/// Middleware that verifies the bearer token on every protected route.
///
/// If valid, inserts the `Caller` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = authenticate(req.headers(), &state.config)?;
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
