//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI document. Every handler and
//! payload exposed by the router is registered here.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ErrorBody, ErrorMessage};
use crate::web::auth::{
    self, AuthResponse, AuthUser, LoginRequest, SignupRequest, UpdateProfileRequest,
};
use crate::web::mentorship::{self, CreateRequestBody};
use crate::web::sessions::{self, CreateSessionBody, UpdateSessionBody};
use crate::web::views::{
    AvailabilityView, MenteeSummary, MessageResponse, Participant, RequestView, SessionView,
    SiteStatsView, UserView,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::get_profile_handler,
        auth::update_profile_handler,
        mentorship::list_mentors_handler,
        mentorship::create_request_handler,
        mentorship::list_mentor_requests_handler,
        mentorship::accept_request_handler,
        mentorship::reject_request_handler,
        mentorship::list_mentees_handler,
        mentorship::all_mentees_handler,
        mentorship::site_stats_handler,
        sessions::accepted_mentors_handler,
        sessions::mentor_availability_handler,
        sessions::create_session_handler,
        sessions::list_sessions_handler,
        sessions::get_session_handler,
        sessions::update_session_handler,
        sessions::delete_session_handler,
    ),
    components(
        schemas(
            SignupRequest, LoginRequest, AuthUser, AuthResponse, UpdateProfileRequest,
            CreateRequestBody, CreateSessionBody, UpdateSessionBody,
            AvailabilityView, UserView, MenteeSummary, RequestView, Participant, SessionView,
            SiteStatsView, MessageResponse, ErrorBody, ErrorMessage
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Mentor Match API", description = "Accounts, mentorship requests and session booking.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme used by the `/auth/*` routes behind `require_auth`.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
