//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup and login, plus the caller's own profile.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use mentor_match_core::domain::{NewUser, ProfileUpdate, Role};
use mentor_match_core::ports::{PortError, PortResultExt};
use mentor_match_core::schedule::Availability;
use mentor_match_core::Caller;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;
use crate::web::token::issue_token;
use crate::web::views::{AvailabilityView, UserView};

const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(example = "mentee")]
    pub role: Option<String>,
    /// Required when `role` is `admin`.
    pub admin_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

/// Partial profile update; omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub goals: Option<String>,
    pub favorite_quote: Option<String>,
    pub availability: Option<AvailabilityView>,
}

//=========================================================================================
// Input Validation
//=========================================================================================

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

struct ValidSignup {
    name: String,
    email: String,
    password: String,
    role: Role,
    admin_key: Option<String>,
}

fn validate_signup(req: SignupRequest) -> Result<ValidSignup, ApiError> {
    let mut errors = Vec::new();

    let name = req.name.map(|n| n.trim().to_string()).unwrap_or_default();
    if name.is_empty() {
        errors.push("Name is required".to_string());
    }

    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    if !is_valid_email(&email) {
        errors.push("Valid email is required".to_string());
    }

    let password = req.password.unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }

    let role = req.role.as_deref().and_then(|r| r.parse::<Role>().ok());
    if role.is_none() {
        errors.push("Role is required".to_string());
    }

    match role {
        Some(role) if errors.is_empty() => Ok(ValidSignup {
            name,
            email,
            password,
            role,
            admin_key: req.admin_key,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

fn validate_profile_update(
    caller: &Caller,
    req: UpdateProfileRequest,
) -> Result<ProfileUpdate, ApiError> {
    let mut errors = Vec::new();

    let name = req.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        errors.push("Name cannot be empty".to_string());
    }
    if req.age.is_some_and(|age| age < 0) {
        errors.push("Age must not be negative".to_string());
    }

    // Profile forms send `{days: [], startTime: "", endTime: ""}` when no hours are set.
    let availability = match req.availability.filter(|view| !view.is_blank()) {
        Some(_) if caller.role != Role::Mentor => {
            errors.push("Only mentors can set availability".to_string());
            None
        }
        Some(view) => match Availability::parse(&view.days, &view.start_time, &view.end_time) {
            Ok(availability) => Some(availability),
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok(ProfileUpdate {
        name,
        age: req.age,
        bio: req.bio,
        skills: req.skills.map(|skills| {
            skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
        goals: req.goals,
        favorite_quote: req.favorite_quote,
        availability,
    })
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid input, wrong admin key or duplicate email", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    // 1. Validate the form
    let signup = validate_signup(req)?;

    // 2. Admin accounts need the configured signup key
    if signup.role == Role::Admin {
        let key_matches = matches!(
            (&state.config.admin_signup_key, &signup.admin_key),
            (Some(expected), Some(given)) if expected == given
        );
        if !key_matches {
            warn!("Rejected admin signup for {}: invalid admin key", signup.email);
            return Err(ApiError::validation("Invalid admin key"));
        }
    }

    // 3. Refuse duplicate emails
    if state.db.get_user_by_email(&signup.email).await.optional()?.is_some() {
        return Err(ApiError::Duplicate("User already exists".to_string()));
    }

    // 4. Hash the password and create the user
    let hashed_password = hash_password(&signup.password)?;
    let user = state
        .db
        .create_user(NewUser {
            name: signup.name,
            email: signup.email,
            hashed_password,
            role: signup.role,
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => ApiError::Duplicate("User already exists".to_string()),
            other => ApiError::Port(other),
        })?;

    // 5. Issue the token
    let token = issue_token(&state.config, user.id, user.role)?;
    info!("Created {} account {}", user.role, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: AuthUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role.to_string(),
            },
        }),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid input or credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    let mut errors = Vec::new();
    if !is_valid_email(&email) {
        errors.push("Valid email is required".to_string());
    }
    let Some(password) = req.password else {
        errors.push("Password is required".to_string());
        return Err(ApiError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let invalid_credentials = || ApiError::validation("Invalid credentials");

    // 1. Get user by email
    let Some(creds) = state.db.get_user_by_email(&email).await.optional()? else {
        return Err(invalid_credentials());
    };

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash for {}: {:?}", creds.user_id, e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    // 3. Issue the token
    let user = state
        .find_user(creds.user_id)
        .await?
        .ok_or_else(invalid_credentials)?;
    let token = issue_token(&state.config, user.id, user.role)?;

    Ok(Json(AuthResponse {
        token,
        user: AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
        },
    }))
}

/// GET /auth/profile - The caller's own profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Profile of the caller", body = UserView),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserView>, ApiError> {
    let user = state
        .find_user(caller.subject_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserView::from(&user)))
}

/// PUT /auth/profile - Update the caller's own profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserView),
        (status = 400, description = "Invalid profile data", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserView>, ApiError> {
    let update = validate_profile_update(&caller, req)?;
    let user = state
        .db
        .update_profile(caller.subject_id, update)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            other => ApiError::Port(other),
        })?;
    Ok(Json(UserView::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign_up, test_state, ADMIN_KEY};

    fn signup(name: &str, email: &str, password: &str, role: &str) -> SignupRequest {
        SignupRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: Some(role.to_string()),
            admin_key: None,
        }
    }

    #[tokio::test]
    async fn signup_reports_every_invalid_field() {
        let state = test_state();
        let err = signup_handler(State(state), ApiJson(SignupRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(
            err.client_messages(),
            vec![
                "Name is required",
                "Valid email is required",
                "Password must be at least 6 characters",
                "Role is required",
            ]
        );
    }

    #[tokio::test]
    async fn admin_signup_requires_the_configured_key() {
        let state = test_state();

        let missing = signup_handler(
            State(state.clone()),
            ApiJson(signup("Root", "root@example.com", "secret1", "admin")),
        )
        .await
        .unwrap_err();
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.client_messages(), vec!["Invalid admin key"]);

        let mut wrong = signup("Root", "root@example.com", "secret1", "admin");
        wrong.admin_key = Some("guess".to_string());
        let wrong = signup_handler(State(state.clone()), ApiJson(wrong)).await.unwrap_err();
        assert_eq!(wrong.client_messages(), vec!["Invalid admin key"]);

        let mut right = signup("Root", "root@example.com", "secret1", "admin");
        right.admin_key = Some(ADMIN_KEY.to_string());
        let (status, Json(body)) = signup_handler(State(state), ApiJson(right)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(!body.token.is_empty());
        assert_eq!(body.user.role, "admin");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let state = test_state();
        sign_up(&state, "Ada", "ada@example.com", Role::Mentor).await;

        let err = signup_handler(
            State(state),
            ApiJson(signup("Ada Again", "ADA@example.com", "secret1", "mentee")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_messages(), vec!["User already exists"]);
    }

    #[tokio::test]
    async fn login_checks_the_password() {
        let state = test_state();
        signup_handler(
            State(state.clone()),
            ApiJson(signup("Grace", "grace@example.com", "hopper42", "mentor")),
        )
        .await
        .unwrap();

        let Json(ok) = login_handler(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: Some("grace@example.com".into()),
                password: Some("hopper42".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.user.name, "Grace");

        for (email, password) in [
            ("grace@example.com", "wrong"),
            ("nobody@example.com", "hopper42"),
        ] {
            let err = login_handler(
                State(state.clone()),
                ApiJson(LoginRequest {
                    email: Some(email.into()),
                    password: Some(password.into()),
                }),
            )
            .await
            .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.client_messages(), vec!["Invalid credentials"]);
        }
    }

    #[tokio::test]
    async fn profile_update_is_partial_and_validates_availability() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Linus", "linus@example.com", Role::Mentor).await;

        let Json(updated) = update_profile_handler(
            State(state.clone()),
            Extension(mentor),
            ApiJson(UpdateProfileRequest {
                bio: Some("Kernel hacker".into()),
                skills: Some(vec!["c".into(), " git ".into()]),
                availability: Some(AvailabilityView {
                    days: vec!["Monday".into(), "thursday".into()],
                    start_time: "9:00".into(),
                    end_time: "17:00".into(),
                }),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Linus");
        assert_eq!(updated.skills, vec!["c", "git"]);
        assert_eq!(
            updated.availability,
            Some(AvailabilityView {
                days: vec!["Monday".into(), "Thursday".into()],
                start_time: "09:00".into(),
                end_time: "17:00".into(),
            })
        );

        let Json(profile) = get_profile_handler(State(state.clone()), Extension(mentor))
            .await
            .unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Kernel hacker"));

        let err = update_profile_handler(
            State(state),
            Extension(mentor),
            ApiJson(UpdateProfileRequest {
                availability: Some(AvailabilityView {
                    days: vec!["Someday".into()],
                    start_time: "18:00".into(),
                    end_time: "09:00".into(),
                }),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_availability_placeholder_is_ignored_for_every_role() {
        let state = test_state();
        let (mentee, _) = sign_up(&state, "Sam", "sam@example.com", Role::Mentee).await;
        let (mentor, _) = sign_up(&state, "Grace", "grace@example.com", Role::Mentor).await;
        let placeholder = || AvailabilityView {
            days: Vec::new(),
            start_time: String::new(),
            end_time: " ".into(),
        };

        for caller in [mentee, mentor] {
            let Json(saved) = update_profile_handler(
                State(state.clone()),
                Extension(caller),
                ApiJson(UpdateProfileRequest {
                    bio: Some("Learning Rust".into()),
                    availability: Some(placeholder()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
            assert_eq!(saved.bio.as_deref(), Some("Learning Rust"));
            assert_eq!(saved.availability, None);
        }
    }

    #[tokio::test]
    async fn mentees_cannot_set_availability() {
        let state = test_state();
        let (mentee, _) = sign_up(&state, "Sam", "sam@example.com", Role::Mentee).await;

        let err = update_profile_handler(
            State(state),
            Extension(mentee),
            ApiJson(UpdateProfileRequest {
                availability: Some(AvailabilityView {
                    days: vec!["Monday".into()],
                    start_time: "09:00".into(),
                    end_time: "10:00".into(),
                }),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.client_messages(), vec!["Only mentors can set availability"]);
    }
}
