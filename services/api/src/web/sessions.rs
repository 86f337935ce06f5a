//! services/api/src/web/sessions.rs
//!
//! Session booking and management endpoints.
//!
//! None of these routes sit behind the auth middleware, and update/delete do not
//! check who owns the session.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mentor_match_core::booking::{validate_booking, BookingContext};
use mentor_match_core::domain::{
    RequestFilter, RequestStatus, Role, Session, SessionFilter, SessionStatus,
};
use mentor_match_core::ports::PortError;
use mentor_match_core::schedule::ClockTime;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{non_blank, parse_calendar_date, parse_id, ApiJson};
use crate::web::state::AppState;
use crate::web::views::{AvailabilityView, MessageResponse, Participant, SessionView, UserView};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    pub mentor_id: Option<String>,
    pub mentee_id: Option<String>,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose UTC date is used.
    #[schema(example = "2024-01-01")]
    pub date: Option<String>,
    /// 24-hour `HH:MM`.
    #[schema(example = "09:30")]
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSessionBody {
    #[schema(example = "confirmed")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub mentor_id: Option<String>,
    pub mentee_id: Option<String>,
    pub status: Option<String>,
}

fn session_not_found(e: PortError) -> ApiError {
    match e {
        PortError::NotFound(_) => ApiError::NotFound("Session not found".to_string()),
        other => ApiError::Port(other),
    }
}

/// Renders a session with both participants populated.
async fn render_session(
    state: &AppState,
    session: &Session,
    with_mentor_availability: bool,
) -> Result<SessionView, ApiError> {
    let users = state
        .users_by_id(&[session.mentor_id, session.mentee_id])
        .await?;
    Ok(SessionView::new(
        session,
        users
            .get(&session.mentor_id)
            .map(|u| Participant::new(u, with_mentor_availability)),
        users.get(&session.mentee_id).map(|u| Participant::new(u, false)),
    ))
}

//=========================================================================================
// Mentor Lookups
//=========================================================================================

/// GET /sessions/mentees/{mentee_id}/mentors - Mentors who accepted this mentee
#[utoipa::path(
    get,
    path = "/sessions/mentees/{mentee_id}/mentors",
    params(("mentee_id" = String, Path, description = "Mentee id")),
    responses(
        (status = 200, description = "Mentors with an accepted request from the mentee", body = [UserView]),
        (status = 400, description = "Malformed id", body = ErrorBody)
    )
)]
pub async fn accepted_mentors_handler(
    State(state): State<Arc<AppState>>,
    Path(mentee_id): Path<String>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let mentee_id = parse_id(&mentee_id, "menteeId")?;
    let accepted = state
        .db
        .list_requests(RequestFilter {
            mentee_id: Some(mentee_id),
            status: Some(RequestStatus::Accepted),
            ..Default::default()
        })
        .await?;
    let mentor_ids: Vec<Uuid> = accepted.iter().map(|r| r.mentor_id).collect();
    let mentors = state.users_by_id(&mentor_ids).await?;

    Ok(Json(
        accepted
            .iter()
            .filter_map(|r| mentors.get(&r.mentor_id))
            .map(UserView::from)
            .collect(),
    ))
}

/// GET /sessions/mentors/{mentor_id}/availability - A mentor's weekly availability
#[utoipa::path(
    get,
    path = "/sessions/mentors/{mentor_id}/availability",
    params(("mentor_id" = String, Path, description = "Mentor id")),
    responses(
        (status = 200, description = "Availability, or an empty object when unset", body = AvailabilityView),
        (status = 404, description = "Mentor not found", body = ErrorBody)
    )
)]
pub async fn mentor_availability_handler(
    State(state): State<Arc<AppState>>,
    Path(mentor_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mentor_id = parse_id(&mentor_id, "mentorId")?;
    let mentor = state
        .find_user(mentor_id)
        .await?
        .filter(|u| u.is(Role::Mentor))
        .ok_or_else(|| ApiError::NotFound("Mentor not found".to_string()))?;

    let body = match &mentor.availability {
        Some(availability) => serde_json::to_value(AvailabilityView::from(availability))
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        None => serde_json::json!({}),
    };
    Ok(Json(body))
}

//=========================================================================================
// Booking
//=========================================================================================

/// POST /sessions - Book a session with a mentor
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionBody,
    responses(
        (status = 201, description = "Session booked with status pending", body = SessionView),
        (status = 400, description = "Invalid input or outside the mentor's availability", body = ErrorBody),
        (status = 403, description = "Mentor has not accepted this mentee", body = ErrorBody),
        (status = 404, description = "Mentor or mentee not found", body = ErrorBody),
        (status = 409, description = "Slot already taken", body = ErrorBody)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateSessionBody>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    // 1. Boundary validation, before any store access
    let (Some(mentor_id), Some(mentee_id), Some(date), Some(time)) = (
        non_blank(body.mentor_id),
        non_blank(body.mentee_id),
        non_blank(body.date),
        non_blank(body.time),
    ) else {
        return Err(ApiError::validation("All fields are required."));
    };
    let mentor_id = parse_id(&mentor_id, "mentorId")?;
    let mentee_id = parse_id(&mentee_id, "menteeId")?;
    let date = parse_calendar_date(&date)
        .ok_or_else(|| ApiError::validation("Invalid date, expected YYYY-MM-DD."))?;
    let time = time
        .parse::<ClockTime>()
        .map_err(|_| ApiError::validation("Invalid time, expected HH:MM."))?;

    // 2. Load everything the validator looks at
    let mentor = state.find_user(mentor_id).await?;
    let mentee = state.find_user(mentee_id).await?;
    let accepted_request_exists = !state
        .db
        .list_requests(RequestFilter {
            mentor_id: Some(mentor_id),
            mentee_id: Some(mentee_id),
            status: Some(RequestStatus::Accepted),
        })
        .await?
        .is_empty();
    // Not atomic with the insert below; concurrent bookings can both get through.
    let existing_session_at_slot = state
        .db
        .find_session_at_slot(mentor_id, date, time)
        .await?
        .is_some();

    // 3. Decide
    let booking = validate_booking(&BookingContext {
        mentor: mentor.as_ref(),
        mentee: mentee.as_ref(),
        accepted_request_exists,
        date,
        time,
        existing_session_at_slot,
    })?;

    // 4. Persist
    let session = state.db.create_session(booking).await?;
    info!(
        "Booked session {} for mentor {} and mentee {} on {} at {}",
        session.id, session.mentor_id, session.mentee_id, session.date, session.time
    );

    let view = render_session(&state, &session, false).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

//=========================================================================================
// Session Management
//=========================================================================================

/// GET /sessions - List sessions, optionally filtered
#[utoipa::path(
    get,
    path = "/sessions",
    params(
        ("mentorId" = Option<String>, Query, description = "Only sessions with this mentor"),
        ("menteeId" = Option<String>, Query, description = "Only sessions with this mentee"),
        ("status" = Option<String>, Query, description = "pending, confirmed or cancelled")
    ),
    responses(
        (status = 200, description = "Sessions ordered by date and time", body = [SessionView]),
        (status = 400, description = "Malformed filter", body = ErrorBody)
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let filter = SessionFilter {
        mentor_id: non_blank(query.mentor_id)
            .map(|raw| parse_id(&raw, "mentorId"))
            .transpose()?,
        mentee_id: non_blank(query.mentee_id)
            .map(|raw| parse_id(&raw, "menteeId"))
            .transpose()?,
        status: non_blank(query.status)
            .map(|raw| {
                raw.parse::<SessionStatus>()
                    .map_err(|_| ApiError::validation("Invalid status filter"))
            })
            .transpose()?,
    };

    let sessions = state.db.list_sessions(filter).await?;
    let user_ids: Vec<Uuid> = sessions
        .iter()
        .flat_map(|s| [s.mentor_id, s.mentee_id])
        .collect();
    let users = state.users_by_id(&user_ids).await?;

    Ok(Json(
        sessions
            .iter()
            .map(|s| {
                SessionView::new(
                    s,
                    users.get(&s.mentor_id).map(|u| Participant::new(u, false)),
                    users.get(&s.mentee_id).map(|u| Participant::new(u, false)),
                )
            })
            .collect(),
    ))
}

/// GET /sessions/{id} - One session, with the mentor's availability
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorBody)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session_id = parse_id(&id, "session id")?;
    let session = state
        .db
        .get_session_by_id(session_id)
        .await
        .map_err(session_not_found)?;
    Ok(Json(render_session(&state, &session, true).await?))
}

/// PUT /sessions/{id} - Set a session's status
#[utoipa::path(
    put,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdateSessionBody,
    responses(
        (status = 200, description = "Updated session", body = SessionView),
        (status = 400, description = "Missing or unknown status", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody)
    )
)]
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateSessionBody>,
) -> Result<Json<SessionView>, ApiError> {
    let status = body
        .status
        .as_deref()
        .and_then(|s| s.parse::<SessionStatus>().ok())
        .ok_or_else(|| ApiError::validation("Valid status is required"))?;
    let session_id = parse_id(&id, "session id")?;

    // Any status may follow any other.
    let session = state
        .db
        .update_session_status(session_id, status)
        .await
        .map_err(session_not_found)?;
    info!("Session {} is now {}", session.id, status.as_str());

    Ok(Json(render_session(&state, &session, false).await?))
}

/// DELETE /sessions/{id} - Delete a session
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 404, description = "Session not found", body = ErrorBody)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session_id = parse_id(&id, "session id")?;
    state
        .db
        .delete_session(session_id)
        .await
        .map_err(session_not_found)?;
    info!("Deleted session {}", session_id);

    Ok(Json(MessageResponse {
        msg: "Session deleted successfully".to_string(),
    }))
}
