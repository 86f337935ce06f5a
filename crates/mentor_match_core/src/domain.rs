//! crates/mentor_match_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::schedule::{Availability, ClockTime};

//=========================================================================================
// Roles
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// The role a user signed up with. Fixed for the lifetime of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Mentor,
    Mentee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "mentor" => Ok(Role::Mentor),
            "mentee" => Ok(Role::Mentee),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// A user profile. Never carries the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub goals: Option<String>,
    pub favorite_quote: Option<String>,
    /// Only meaningful for mentors.
    pub availability: Option<Availability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub hashed_password: String,
}

/// Everything needed to persist a freshly signed-up account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
}

/// A partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub goals: Option<String>,
    pub favorite_quote: Option<String>,
    pub availability: Option<Availability>,
}

impl ProfileUpdate {
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio);
        }
        if let Some(skills) = self.skills {
            user.skills = skills;
        }
        if let Some(goals) = self.goals {
            user.goals = Some(goals);
        }
        if let Some(quote) = self.favorite_quote {
            user.favorite_quote = Some(quote);
        }
        if let Some(availability) = self.availability {
            user.availability = Some(availability);
        }
    }
}

/// Filter for user listings. All present criteria must match.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub role: Option<Role>,
    /// Exact membership in the user's skill set.
    pub skill: Option<String>,
    /// Case-insensitive substring of the name, matched literally.
    pub name_contains: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.id.map_or(true, |id| user.id == id)
            && self.role.map_or(true, |role| user.role == role)
            && self
                .skill
                .as_ref()
                .map_or(true, |skill| user.skills.iter().any(|s| s == skill))
            && self.name_contains.as_ref().map_or(true, |needle| {
                user.name.to_lowercase().contains(&needle.to_lowercase())
            })
    }
}

/// Headcount shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteStats {
    pub mentor_count: u64,
    pub mentee_count: u64,
    pub total_count: u64,
}

//=========================================================================================
// Mentorship Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Request has already been resolved.")]
pub struct TransitionError {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

/// Lifecycle of a mentorship request. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Validates a mentor's decision. Only `Pending -> Accepted` and
    /// `Pending -> Rejected` exist; there is no revocation.
    pub fn transition_to(self, next: RequestStatus) -> Result<RequestStatus, TransitionError> {
        match (self, next) {
            (RequestStatus::Pending, RequestStatus::Accepted | RequestStatus::Rejected) => Ok(next),
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A mentee's proposal to be mentored by a specific mentor.
#[derive(Debug, Clone)]
pub struct MentorshipRequest {
    pub id: Uuid,
    pub mentee_id: Uuid,
    pub mentor_id: Uuid,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for request listings. Results are ordered newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub mentor_id: Option<Uuid>,
    pub mentee_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
}

impl RequestFilter {
    pub fn matches(&self, request: &MentorshipRequest) -> bool {
        self.mentor_id.map_or(true, |id| request.mentor_id == id)
            && self.mentee_id.map_or(true, |id| request.mentee_id == id)
            && self.status.map_or(true, |s| request.status == s)
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

/// Status of a booked session. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "confirmed" => Ok(SessionStatus::Confirmed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A meeting booked between an accepted mentor/mentee pair.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

/// A validated booking ready to be persisted with status `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub date: NaiveDate,
    pub time: ClockTime,
}

/// Filter for session listings. Results are ordered by date, then time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFilter {
    pub mentor_id: Option<Uuid>,
    pub mentee_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        self.mentor_id.map_or(true, |id| session.mentor_id == id)
            && self.mentee_id.map_or(true, |id| session.mentee_id == id)
            && self.status.map_or(true, |s| session.status == s)
    }
}
