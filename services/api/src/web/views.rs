//! services/api/src/web/views.rs
//!
//! JSON shapes returned by the REST API. Field names are camelCase on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use mentor_match_core::domain::{MentorshipRequest, Session, SiteStats, User};
use mentor_match_core::schedule::Availability;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A mentor's weekly availability as exchanged with clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityView {
    #[schema(example = json!(["Monday", "Wednesday"]))]
    pub days: Vec<String>,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
}

impl AvailabilityView {
    /// No days and no times: what a profile form sends when hours are unset.
    pub fn is_blank(&self) -> bool {
        self.days.is_empty()
            && self.start_time.trim().is_empty()
            && self.end_time.trim().is_empty()
    }
}

impl From<&Availability> for AvailabilityView {
    fn from(a: &Availability) -> Self {
        Self {
            days: a.day_names(),
            start_time: a.start_time.to_string(),
            end_time: a.end_time.to_string(),
        }
    }
}

/// A user profile with the password stripped.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[schema(example = "mentor")]
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.to_string(),
            age: u.age,
            bio: u.bio.clone(),
            skills: u.skills.clone(),
            goals: u.goals.clone(),
            favorite_quote: u.favorite_quote.clone(),
            availability: u.availability.as_ref().map(AvailabilityView::from),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// The subset of a mentee shown to a mentor reviewing requests.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenteeSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub skills: Vec<String>,
}

impl From<&User> for MenteeSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            bio: u.bio.clone(),
            skills: u.skills.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: Uuid,
    pub mentee_id: Uuid,
    pub mentor_id: Uuid,
    /// Present only on the mentor's request listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentee: Option<MenteeSummary>,
    #[schema(example = "pending")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestView {
    pub fn new(request: &MentorshipRequest, mentee: Option<&User>) -> Self {
        Self {
            id: request.id,
            mentee_id: request.mentee_id,
            mentor_id: request.mentor_id,
            mentee: mentee.map(MenteeSummary::from),
            status: request.status.as_str().to_string(),
            message: request.message.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// One side of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityView>,
}

impl Participant {
    pub fn new(user: &User, with_availability: bool) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            availability: with_availability
                .then(|| user.availability.as_ref().map(AvailabilityView::from))
                .flatten(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub mentor: Option<Participant>,
    pub mentee: Option<Participant>,
    pub date: NaiveDate,
    #[schema(example = "09:30")]
    pub time: String,
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl SessionView {
    pub fn new(
        session: &Session,
        mentor: Option<Participant>,
        mentee: Option<Participant>,
    ) -> Self {
        Self {
            id: session.id,
            mentor_id: session.mentor_id,
            mentee_id: session.mentee_id,
            mentor,
            mentee,
            date: session.date,
            time: session.time.to_string(),
            status: session.status.as_str().to_string(),
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatsView {
    pub mentor_count: u64,
    pub mentee_count: u64,
    pub total_count: u64,
}

impl From<SiteStats> for SiteStatsView {
    fn from(s: SiteStats) -> Self {
        Self {
            mentor_count: s.mentor_count,
            mentee_count: s.mentee_count,
            total_count: s.total_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub msg: String,
}
