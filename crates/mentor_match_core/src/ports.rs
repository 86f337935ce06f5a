//! crates/mentor_match_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    MentorshipRequest, NewSession, NewUser, ProfileUpdate, RequestFilter, RequestStatus, Role,
    Session, SessionFilter, SessionStatus, User, UserCredentials, UserFilter,
};
use crate::schedule::ClockTime;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A storage uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

pub trait PortResultExt<T> {
    /// Turns `NotFound` into `Ok(None)`, leaving every other error intact.
    fn optional(self) -> PortResult<Option<T>>;
}

impl<T> PortResultExt<T> for PortResult<T> {
    fn optional(self) -> PortResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for users, mentorship requests and sessions.
///
/// Every method is atomic on its own. Nothing here spans several records, so
/// check-then-write sequences built on top of it can race.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` if the email is already registered.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User>;

    async fn list_users(&self, filter: UserFilter) -> PortResult<Vec<User>>;

    async fn count_users(&self, role: Option<Role>) -> PortResult<u64>;

    // --- Mentorship Requests ---
    async fn create_request(
        &self,
        mentee_id: Uuid,
        mentor_id: Uuid,
        message: Option<String>,
    ) -> PortResult<MentorshipRequest>;

    /// Newest first.
    async fn list_requests(&self, filter: RequestFilter) -> PortResult<Vec<MentorshipRequest>>;

    /// Looks a request up only among those addressed to `mentor_id`, so a
    /// request owned by someone else reads as `NotFound`.
    async fn get_request_for_mentor(
        &self,
        request_id: Uuid,
        mentor_id: Uuid,
    ) -> PortResult<MentorshipRequest>;

    async fn set_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> PortResult<MentorshipRequest>;

    // --- Sessions ---
    async fn create_session(&self, session: NewSession) -> PortResult<Session>;

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session>;

    /// Any session at exactly (mentor, date, time), whatever its status.
    async fn find_session_at_slot(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        time: ClockTime,
    ) -> PortResult<Option<Session>>;

    /// Ordered by date, then time.
    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<Session>>;

    async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
    ) -> PortResult<Session>;

    async fn delete_session(&self, session_id: Uuid) -> PortResult<()>;
}
