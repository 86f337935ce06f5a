//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Used by the test
//! suite and selected at runtime with `DATABASE_URL=memory://`. Contents are lost
//! when the process exits.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use mentor_match_core::domain::{
    MentorshipRequest, NewSession, NewUser, ProfileUpdate, RequestFilter, RequestStatus, Role,
    Session, SessionFilter, SessionStatus, User, UserCredentials, UserFilter,
};
use mentor_match_core::ports::{DatabaseService, PortError, PortResult};
use mentor_match_core::schedule::ClockTime;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredUser {
    profile: User,
    hashed_password: String,
    /// Breaks ties between users created within the same clock tick.
    seq: u64,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, StoredUser>,
    next_user_seq: u64,
    /// Insertion order.
    requests: Vec<MentorshipRequest>,
    sessions: Vec<Session>,
}

/// A `DatabaseService` backed by in-memory tables behind one lock.
#[derive(Default)]
pub struct MemoryAdapter {
    tables: RwLock<Tables>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn user_not_found(user_id: Uuid) -> PortError {
    PortError::NotFound(format!("User {} not found", user_id))
}

fn request_not_found(request_id: Uuid) -> PortError {
    PortError::NotFound(format!("Request {} not found", request_id))
}

fn session_not_found(session_id: Uuid) -> PortError {
    PortError::NotFound(format!("Session {} not found", session_id))
}

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.profile.email == new_user.email) {
            return Err(PortError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let profile = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            age: None,
            bio: None,
            skills: Vec::new(),
            goals: None,
            favorite_quote: None,
            availability: None,
            created_at: now,
            updated_at: now,
        };
        let seq = tables.next_user_seq;
        tables.next_user_seq += 1;
        tables.users.insert(
            profile.id,
            StoredUser {
                profile: profile.clone(),
                hashed_password: new_user.hashed_password,
                seq,
            },
        );
        Ok(profile)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .map(|u| u.profile.clone())
            .ok_or_else(|| user_not_found(user_id))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.profile.email == email)
            .map(|u| UserCredentials {
                user_id: u.profile.id,
                email: u.profile.email.clone(),
                role: u.profile.role,
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("No user with email {}", email)))
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        update.apply_to(&mut stored.profile);
        stored.profile.updated_at = Utc::now();
        Ok(stored.profile.clone())
    }

    async fn list_users(&self, filter: UserFilter) -> PortResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<&StoredUser> = tables
            .users
            .values()
            .filter(|u| filter.matches(&u.profile))
            .collect();
        users.sort_by_key(|u| (u.profile.created_at, u.seq));
        Ok(users.into_iter().map(|u| u.profile.clone()).collect())
    }

    async fn count_users(&self, role: Option<Role>) -> PortResult<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.profile.role == r))
            .count();
        Ok(count as u64)
    }

    async fn create_request(
        &self,
        mentee_id: Uuid,
        mentor_id: Uuid,
        message: Option<String>,
    ) -> PortResult<MentorshipRequest> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let request = MentorshipRequest {
            id: Uuid::new_v4(),
            mentee_id,
            mentor_id,
            status: RequestStatus::Pending,
            message,
            created_at: now,
            updated_at: now,
        };
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn list_requests(&self, filter: RequestFilter) -> PortResult<Vec<MentorshipRequest>> {
        let tables = self.tables.read().await;
        // Reverse insertion order first so equal timestamps still come out newest first.
        let mut requests: Vec<MentorshipRequest> = tables
            .requests
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn get_request_for_mentor(
        &self,
        request_id: Uuid,
        mentor_id: Uuid,
    ) -> PortResult<MentorshipRequest> {
        let tables = self.tables.read().await;
        tables
            .requests
            .iter()
            .find(|r| r.id == request_id && r.mentor_id == mentor_id)
            .cloned()
            .ok_or_else(|| request_not_found(request_id))
    }

    async fn set_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> PortResult<MentorshipRequest> {
        let mut tables = self.tables.write().await;
        let request = tables
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| request_not_found(request_id))?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn create_session(&self, session: NewSession) -> PortResult<Session> {
        let mut tables = self.tables.write().await;
        let session = Session {
            id: Uuid::new_v4(),
            mentor_id: session.mentor_id,
            mentee_id: session.mentee_id,
            date: session.date,
            time: session.time,
            status: SessionStatus::Pending,
            created_at: Utc::now(),
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        let tables = self.tables.read().await;
        tables
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn find_session_at_slot(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        time: ClockTime,
    ) -> PortResult<Option<Session>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.mentor_id == mentor_id && s.date == date && s.time == time)
            .cloned())
    }

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.time));
        Ok(sessions)
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
    ) -> PortResult<Session> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.status = status;
        Ok(session.clone())
    }

    async fn delete_session(&self, session_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.id != session_id);
        if tables.sessions.len() == before {
            return Err(session_not_found(session_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            hashed_password: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let db = MemoryAdapter::new();
        db.create_user(new_user("a@example.com", Role::Mentor)).await.unwrap();

        let err = db
            .create_user(new_user("a@example.com", Role::Mentee))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
        assert_eq!(db.count_users(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn request_lookup_is_scoped_to_the_addressed_mentor() {
        let db = MemoryAdapter::new();
        let mentor = db.create_user(new_user("m@example.com", Role::Mentor)).await.unwrap();
        let mentee = db.create_user(new_user("e@example.com", Role::Mentee)).await.unwrap();
        let request = db.create_request(mentee.id, mentor.id, None).await.unwrap();

        assert!(db.get_request_for_mentor(request.id, mentor.id).await.is_ok());
        assert!(matches!(
            db.get_request_for_mentor(request.id, mentee.id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sessions_list_in_date_then_time_order() {
        let db = MemoryAdapter::new();
        let mentor_id = Uuid::new_v4();
        let mentee_id = Uuid::new_v4();
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let at = |t: &str| t.parse::<ClockTime>().unwrap();

        for (date, time) in [(day(8), "09:00"), (day(1), "15:00"), (day(1), "09:30")] {
            db.create_session(NewSession { mentor_id, mentee_id, date, time: at(time) })
                .await
                .unwrap();
        }

        let listed: Vec<(NaiveDate, String)> = db
            .list_sessions(SessionFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.date, s.time.to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (day(1), "09:30".to_string()),
                (day(1), "15:00".to_string()),
                (day(8), "09:00".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn deleting_a_missing_session_is_not_found() {
        let db = MemoryAdapter::new();
        assert!(matches!(
            db.delete_session(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }
}
