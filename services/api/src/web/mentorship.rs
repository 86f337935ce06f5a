//! services/api/src/web/mentorship.rs
//!
//! Mentor discovery, the mentorship request lifecycle, and the admin
//! dashboard endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use mentor_match_core::domain::{RequestFilter, RequestStatus, Role, SiteStats, UserFilter};
use mentor_match_core::ports::PortError;
use mentor_match_core::{Caller, Rule};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{non_blank, parse_id, ApiJson};
use crate::web::state::AppState;
use crate::web::views::{RequestView, SiteStatsView, UserView};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MentorQuery {
    pub skill: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub mentor_id: Option<String>,
    pub message: Option<String>,
}

//=========================================================================================
// Discovery
//=========================================================================================

/// GET /auth/mentors - List mentors, optionally filtered
#[utoipa::path(
    get,
    path = "/auth/mentors",
    params(
        ("skill" = Option<String>, Query, description = "Only mentors listing this exact skill"),
        ("name" = Option<String>, Query, description = "Case-insensitive part of the mentor's name"),
        ("id" = Option<String>, Query, description = "Only the mentor with this id")
    ),
    responses(
        (status = 200, description = "Matching mentors", body = [UserView]),
        (status = 400, description = "Malformed id", body = ErrorBody)
    )
)]
pub async fn list_mentors_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MentorQuery>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let id = non_blank(query.id)
        .map(|raw| parse_id(&raw, "id"))
        .transpose()?;
    let filter = UserFilter {
        id,
        role: Some(Role::Mentor),
        skill: non_blank(query.skill),
        name_contains: non_blank(query.name),
    };

    let mentors = state.db.list_users(filter).await?;
    Ok(Json(mentors.iter().map(UserView::from).collect()))
}

//=========================================================================================
// Request Lifecycle
//=========================================================================================

/// POST /auth/requests - A mentee asks a mentor for mentorship
#[utoipa::path(
    post,
    path = "/auth/requests",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request created", body = RequestView),
        (status = 400, description = "Invalid input or duplicate request", body = ErrorBody),
        (status = 403, description = "Caller is not a mentee", body = ErrorBody),
        (status = 404, description = "Mentor not found", body = ErrorBody)
    )
)]
pub async fn create_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestView>), ApiError> {
    caller.require(&[Rule::MENTEE])?;

    let mentor_id = non_blank(body.mentor_id)
        .ok_or_else(|| ApiError::validation("mentorId is required"))
        .and_then(|raw| parse_id(&raw, "mentorId"))?;

    state
        .find_user(mentor_id)
        .await?
        .filter(|u| u.is(Role::Mentor))
        .ok_or_else(|| ApiError::NotFound("Mentor not found".to_string()))?;

    // Best-effort duplicate check; two concurrent requests can both pass it.
    let existing = state
        .db
        .list_requests(RequestFilter {
            mentor_id: Some(mentor_id),
            mentee_id: Some(caller.subject_id),
            status: None,
        })
        .await?;
    if existing.iter().any(|r| r.status == RequestStatus::Pending) {
        return Err(ApiError::Duplicate("Request already sent and pending.".to_string()));
    }
    if existing.iter().any(|r| r.status == RequestStatus::Accepted) {
        return Err(ApiError::Duplicate("You are already a mentee of this mentor.".to_string()));
    }

    let request = state
        .db
        .create_request(caller.subject_id, mentor_id, non_blank(body.message))
        .await?;
    info!("Mentee {} requested mentor {}", caller.subject_id, mentor_id);

    Ok((StatusCode::CREATED, Json(RequestView::new(&request, None))))
}

/// GET /auth/requests/mentor - Requests addressed to the calling mentor
#[utoipa::path(
    get,
    path = "/auth/requests/mentor",
    responses(
        (status = 200, description = "Requests, newest first, with mentee summaries", body = [RequestView]),
        (status = 403, description = "Caller is not a mentor", body = ErrorBody)
    )
)]
pub async fn list_mentor_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    caller.require(&[Rule::MENTOR])?;

    let requests = state
        .db
        .list_requests(RequestFilter {
            mentor_id: Some(caller.subject_id),
            ..Default::default()
        })
        .await?;
    let mentee_ids: Vec<Uuid> = requests.iter().map(|r| r.mentee_id).collect();
    let mentees = state.users_by_id(&mentee_ids).await?;

    Ok(Json(
        requests
            .iter()
            .map(|r| RequestView::new(r, mentees.get(&r.mentee_id)))
            .collect(),
    ))
}

/// Moves a request addressed to `caller` out of `Pending`.
async fn resolve_request(
    state: &AppState,
    caller: Caller,
    raw_id: &str,
    decision: RequestStatus,
) -> Result<RequestView, ApiError> {
    let request_id = parse_id(raw_id, "request id")?;

    // Scoped to the caller: someone else's request reads as missing.
    let request = state
        .db
        .get_request_for_mentor(request_id, caller.subject_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::NotFound("Request not found".to_string()),
            other => ApiError::Port(other),
        })?;

    let next = request.status.transition_to(decision)?;
    let updated = state.db.set_request_status(request.id, next).await?;
    info!(
        "Mentor {} {} request {}",
        caller.subject_id,
        next.as_str(),
        updated.id
    );

    Ok(RequestView::new(&updated, None))
}

/// PUT /auth/requests/{id}/accept - The addressed mentor accepts a request
#[utoipa::path(
    put,
    path = "/auth/requests/{id}/accept",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request accepted", body = RequestView),
        (status = 404, description = "No such request addressed to the caller", body = ErrorBody),
        (status = 409, description = "Request has already been resolved", body = ErrorBody)
    )
)]
pub async fn accept_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<RequestView>, ApiError> {
    resolve_request(&state, caller, &id, RequestStatus::Accepted)
        .await
        .map(Json)
}

/// PUT /auth/requests/{id}/reject - The addressed mentor rejects a request
#[utoipa::path(
    put,
    path = "/auth/requests/{id}/reject",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request rejected", body = RequestView),
        (status = 404, description = "No such request addressed to the caller", body = ErrorBody),
        (status = 409, description = "Request has already been resolved", body = ErrorBody)
    )
)]
pub async fn reject_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<RequestView>, ApiError> {
    resolve_request(&state, caller, &id, RequestStatus::Rejected)
        .await
        .map(Json)
}

/// GET /auth/mentees - Mentees the calling mentor has accepted
#[utoipa::path(
    get,
    path = "/auth/mentees",
    responses(
        (status = 200, description = "Accepted mentees, most recent request first", body = [UserView]),
        (status = 403, description = "Caller is not a mentor", body = ErrorBody)
    )
)]
pub async fn list_mentees_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    caller.require(&[Rule::MENTOR])?;

    let accepted = state
        .db
        .list_requests(RequestFilter {
            mentor_id: Some(caller.subject_id),
            status: Some(RequestStatus::Accepted),
            ..Default::default()
        })
        .await?;
    let mentee_ids: Vec<Uuid> = accepted.iter().map(|r| r.mentee_id).collect();
    let mentees = state.users_by_id(&mentee_ids).await?;

    Ok(Json(
        accepted
            .iter()
            .filter_map(|r| mentees.get(&r.mentee_id))
            .map(UserView::from)
            .collect(),
    ))
}

//=========================================================================================
// Admin
//=========================================================================================

/// GET /auth/all-mentees - Every mentee account (admin only)
#[utoipa::path(
    get,
    path = "/auth/all-mentees",
    responses(
        (status = 200, description = "All mentees", body = [UserView]),
        (status = 403, description = "Admin access required", body = ErrorBody)
    )
)]
pub async fn all_mentees_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    caller.require(&[Rule::ADMIN])?;

    let mentees = state
        .db
        .list_users(UserFilter {
            role: Some(Role::Mentee),
            ..Default::default()
        })
        .await?;
    Ok(Json(mentees.iter().map(UserView::from).collect()))
}

/// GET /auth/site-stats - User counts for the admin dashboard
#[utoipa::path(
    get,
    path = "/auth/site-stats",
    responses(
        (status = 200, description = "User counts", body = SiteStatsView),
        (status = 403, description = "Admin access required", body = ErrorBody)
    )
)]
pub async fn site_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<SiteStatsView>, ApiError> {
    caller.require(&[Rule::ADMIN])?;

    let stats = SiteStats {
        mentor_count: state.db.count_users(Some(Role::Mentor)).await?,
        mentee_count: state.db.count_users(Some(Role::Mentee)).await?,
        total_count: state.db.count_users(None).await?,
    };
    Ok(Json(stats.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign_up, test_state};
    use mentor_match_core::domain::ProfileUpdate;

    async fn send_request(
        state: &Arc<AppState>,
        mentee: Caller,
        mentor: Caller,
    ) -> Result<(StatusCode, Json<RequestView>), ApiError> {
        create_request_handler(
            State(state.clone()),
            Extension(mentee),
            ApiJson(CreateRequestBody {
                mentor_id: Some(mentor.subject_id.to_string()),
                message: Some("Hi!".to_string()),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn mentors_can_be_filtered_by_skill_and_name() {
        let state = test_state();
        let (ada, _) = sign_up(&state, "Ada Lovelace", "ada@example.com", Role::Mentor).await;
        sign_up(&state, "Alan Turing", "alan@example.com", Role::Mentor).await;
        sign_up(&state, "Sam Mentee", "sam@example.com", Role::Mentee).await;
        state
            .db
            .update_profile(
                ada.subject_id,
                ProfileUpdate {
                    skills: Some(vec!["math".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let names = |mentors: Vec<UserView>| {
            mentors.into_iter().map(|m| m.name).collect::<Vec<_>>()
        };

        let Json(all) = list_mentors_handler(State(state.clone()), Query(MentorQuery::default()))
            .await
            .unwrap();
        assert_eq!(names(all), vec!["Ada Lovelace", "Alan Turing"]);

        let Json(by_skill) = list_mentors_handler(
            State(state.clone()),
            Query(MentorQuery {
                skill: Some("math".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(names(by_skill), vec!["Ada Lovelace"]);

        let Json(by_name) = list_mentors_handler(
            State(state.clone()),
            Query(MentorQuery {
                name: Some("TURING".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(names(by_name), vec!["Alan Turing"]);

        let Json(by_id) = list_mentors_handler(
            State(state),
            Query(MentorQuery {
                id: Some(ada.subject_id.to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(names(by_id), vec!["Ada Lovelace"]);
    }

    #[tokio::test]
    async fn second_request_while_pending_is_rejected() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        let (mentee, _) = sign_up(&state, "Mentee", "mentee@example.com", Role::Mentee).await;

        let (status, Json(first)) = send_request(&state, mentee, mentor).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first.status, "pending");

        let err = send_request(&state, mentee, mentor).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_messages(), vec!["Request already sent and pending."]);
    }

    #[tokio::test]
    async fn accepted_mentee_cannot_request_again() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        let (mentee, _) = sign_up(&state, "Mentee", "mentee@example.com", Role::Mentee).await;

        let (_, Json(request)) = send_request(&state, mentee, mentor).await.unwrap();
        accept_request_handler(
            State(state.clone()),
            Extension(mentor),
            Path(request.id.to_string()),
        )
        .await
        .unwrap();

        let err = send_request(&state, mentee, mentor).await.unwrap_err();
        assert_eq!(err.client_messages(), vec!["You are already a mentee of this mentor."]);
    }

    #[tokio::test]
    async fn rejected_mentee_may_ask_again() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        let (mentee, _) = sign_up(&state, "Mentee", "mentee@example.com", Role::Mentee).await;

        let (_, Json(first)) = send_request(&state, mentee, mentor).await.unwrap();
        reject_request_handler(
            State(state.clone()),
            Extension(mentor),
            Path(first.id.to_string()),
        )
        .await
        .unwrap();

        let (status, Json(second)) = send_request(&state, mentee, mentor).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second.status, "pending");
        assert_ne!(second.id, first.id);

        let Json(requests) = list_mentor_requests_handler(State(state), Extension(mentor))
            .await
            .unwrap();
        let statuses: Vec<&str> = requests.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, vec!["pending", "rejected"]);
    }

    #[tokio::test]
    async fn only_mentees_send_requests_and_only_to_mentors() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        let (other_mentor, _) = sign_up(&state, "Other", "other@example.com", Role::Mentor).await;
        let (mentee, _) = sign_up(&state, "Mentee", "mentee@example.com", Role::Mentee).await;
        let (another_mentee, _) =
            sign_up(&state, "Another", "another@example.com", Role::Mentee).await;

        let err = send_request(&state, other_mentor, mentor).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = send_request(&state, mentee, another_mentee).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_messages(), vec!["Mentor not found"]);
    }

    #[tokio::test]
    async fn only_the_addressed_mentor_can_resolve_a_request() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        let (other_mentor, _) = sign_up(&state, "Other", "other@example.com", Role::Mentor).await;
        let (mentee, _) = sign_up(&state, "Mentee", "mentee@example.com", Role::Mentee).await;
        let (_, Json(request)) = send_request(&state, mentee, mentor).await.unwrap();

        for intruder in [other_mentor, mentee] {
            let err = accept_request_handler(
                State(state.clone()),
                Extension(intruder),
                Path(request.id.to_string()),
            )
            .await
            .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
            assert_eq!(err.client_messages(), vec!["Request not found"]);
        }

        let Json(rejected) = reject_request_handler(
            State(state.clone()),
            Extension(mentor),
            Path(request.id.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(rejected.status, "rejected");

        // Terminal states have no way out.
        let err = accept_request_handler(
            State(state),
            Extension(mentor),
            Path(request.id.to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn mentor_sees_requests_with_mentee_summaries_and_accepted_mentees() {
        let state = test_state();
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        let (first, _) = sign_up(&state, "First", "first@example.com", Role::Mentee).await;
        let (second, _) = sign_up(&state, "Second", "second@example.com", Role::Mentee).await;

        let (_, Json(r1)) = send_request(&state, first, mentor).await.unwrap();
        send_request(&state, second, mentor).await.unwrap();
        accept_request_handler(State(state.clone()), Extension(mentor), Path(r1.id.to_string()))
            .await
            .unwrap();

        let Json(requests) = list_mentor_requests_handler(State(state.clone()), Extension(mentor))
            .await
            .unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].mentee.as_ref().map(|m| m.name.as_str()), Some("Second"));
        assert_eq!(requests[1].status, "accepted");

        let Json(mentees) = list_mentees_handler(State(state.clone()), Extension(mentor))
            .await
            .unwrap();
        assert_eq!(mentees.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["First"]);

        let err = list_mentees_handler(State(state), Extension(first)).await.unwrap_err();
        assert_eq!(err.client_messages(), vec!["Mentor access required"]);
    }

    #[tokio::test]
    async fn admin_views_are_admin_only() {
        let state = test_state();
        let (admin, _) = sign_up(&state, "Admin", "admin@example.com", Role::Admin).await;
        let (mentor, _) = sign_up(&state, "Mentor", "mentor@example.com", Role::Mentor).await;
        sign_up(&state, "Mentee A", "a@example.com", Role::Mentee).await;
        sign_up(&state, "Mentee B", "b@example.com", Role::Mentee).await;

        let Json(stats) = site_stats_handler(State(state.clone()), Extension(admin)).await.unwrap();
        assert_eq!((stats.mentor_count, stats.mentee_count, stats.total_count), (1, 2, 4));

        let Json(mentees) = all_mentees_handler(State(state.clone()), Extension(admin))
            .await
            .unwrap();
        assert_eq!(mentees.len(), 2);

        let err = site_stats_handler(State(state), Extension(mentor)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.client_messages(), vec!["Admin access required"]);
    }
}
