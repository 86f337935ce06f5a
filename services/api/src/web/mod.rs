pub mod auth;
pub mod extract;
pub mod mentorship;
pub mod middleware;
pub mod rest;
pub mod sessions;
pub mod state;
pub mod token;
pub mod views;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
use state::AppState;

/// Builds the API router. `/auth/signup`, `/auth/login`, `/auth/mentors` and all
/// `/sessions` routes are public; everything else needs a bearer token.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/mentors", get(mentorship::list_mentors_handler))
        .route(
            "/sessions",
            post(sessions::create_session_handler).get(sessions::list_sessions_handler),
        )
        .route(
            "/sessions/{id}",
            get(sessions::get_session_handler)
                .put(sessions::update_session_handler)
                .delete(sessions::delete_session_handler),
        )
        .route(
            "/sessions/mentees/{mentee_id}/mentors",
            get(sessions::accepted_mentors_handler),
        )
        .route(
            "/sessions/mentors/{mentor_id}/availability",
            get(sessions::mentor_availability_handler),
        );

    let protected_routes = Router::new()
        .route(
            "/auth/profile",
            get(auth::get_profile_handler).put(auth::update_profile_handler),
        )
        .route("/auth/requests", post(mentorship::create_request_handler))
        .route(
            "/auth/requests/mentor",
            get(mentorship::list_mentor_requests_handler),
        )
        .route(
            "/auth/requests/{id}/accept",
            put(mentorship::accept_request_handler),
        )
        .route(
            "/auth/requests/{id}/reject",
            put(mentorship::reject_request_handler),
        )
        .route("/auth/mentees", get(mentorship::list_mentees_handler))
        .route("/auth/all-mentees", get(mentorship::all_mentees_handler))
        .route("/auth/site-stats", get(mentorship::site_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
