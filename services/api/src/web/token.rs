//! services/api/src/web/token.rs
//!
//! Issues and verifies the signed bearer tokens that identify callers.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use mentor_match_core::{Caller, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

/// Claims carried by every access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// ID of the user the token was issued to.
    pub sub: Uuid,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a token for `user_id` that expires after the configured lifetime.
pub fn issue_token(config: &Config, user_id: Uuid, role: Role) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + config.token_ttl).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to encode a JSON Web Token: {}", e)))
}

/// Checks the signature and expiry of `token` and returns the caller it names.
pub fn verify_token(config: &Config, token: &str) -> Result<Caller, ApiError> {
    let invalid = || ApiError::Unauthenticated("Token is not valid".to_string());

    let claims = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        invalid()
    })?
    .claims;

    let role = claims.role.parse::<Role>().map_err(|_| invalid())?;
    Ok(Caller::new(claims.sub, role))
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
