//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mentor_match_core::domain::{
    MentorshipRequest, NewSession, NewUser, ProfileUpdate, RequestFilter, RequestStatus, Role,
    Session, SessionFilter, SessionStatus, User, UserCredentials, UserFilter,
};
use mentor_match_core::ports::{DatabaseService, PortError, PortResult};
use mentor_match_core::schedule::{Availability, ClockTime};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, role, age, bio, skills, goals, favorite_quote, \
     availability_days, availability_start, availability_end, created_at, updated_at";
const REQUEST_COLUMNS: &str = "id, mentee_id, mentor_id, status, message, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, mentor_id, mentee_id, date, time, status, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn corrupt(what: &str, id: Uuid, detail: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("Stored {} {} is malformed: {}", what, id, detail))
}

/// Escapes `%`, `_` and `\` so the needle matches literally under `ILIKE`.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    age: Option<i32>,
    bio: Option<String>,
    skills: Vec<String>,
    goals: Option<String>,
    favorite_quote: Option<String>,
    availability_days: Option<Vec<String>>,
    availability_start: Option<String>,
    availability_end: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| corrupt("user", self.id, e))?;

        let availability = match (
            self.availability_days,
            self.availability_start,
            self.availability_end,
        ) {
            (Some(days), Some(start), Some(end)) => Some(
                Availability::parse(&days, &start, &end).map_err(|e| corrupt("user", self.id, e))?,
            ),
            _ => None,
        };

        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            role,
            age: self.age,
            bio: self.bio,
            skills: self.skills,
            goals: self.goals,
            favorite_quote: self.favorite_quote,
            availability,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    role: String,
    password_hash: String,
}

#[derive(FromRow)]
struct RequestRecord {
    id: Uuid,
    mentee_id: Uuid,
    mentor_id: Uuid,
    status: String,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRecord {
    fn to_domain(self) -> PortResult<MentorshipRequest> {
        let status = self
            .status
            .parse::<RequestStatus>()
            .map_err(|e| corrupt("request", self.id, e))?;
        Ok(MentorshipRequest {
            id: self.id,
            mentee_id: self.mentee_id,
            mentor_id: self.mentor_id,
            status,
            message: self.message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    date: NaiveDate,
    time: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        let time = self
            .time
            .parse::<ClockTime>()
            .map_err(|e| corrupt("session", self.id, e))?;
        let status = self
            .status
            .parse::<SessionStatus>()
            .map_err(|e| corrupt("session", self.id, e))?;
        Ok(Session {
            id: self.id,
            mentor_id: self.mentor_id,
            mentee_id: self.mentee_id,
            date: self.date,
            time,
            status,
            created_at: self.created_at,
        })
    }
}

fn collect<R, T>(records: Vec<R>, to_domain: fn(R) -> PortResult<T>) -> PortResult<Vec<T>> {
    records.into_iter().map(to_domain).collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .bind(new_user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PortError::Conflict("User already exists".to_string())
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?
            .to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("No user with email {}", email)))?;

        Ok(UserCredentials {
            user_id: record.id,
            role: record
                .role
                .parse()
                .map_err(|e| corrupt("user", record.id, e))?,
            email: record.email,
            hashed_password: record.password_hash,
        })
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User> {
        let (days, start, end) = match update.availability {
            Some(a) => (
                Some(a.day_names()),
                Some(a.start_time.to_string()),
                Some(a.end_time.to_string()),
            ),
            None => (None, None, None),
        };

        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                age = COALESCE($3, age), \
                bio = COALESCE($4, bio), \
                skills = COALESCE($5, skills), \
                goals = COALESCE($6, goals), \
                favorite_quote = COALESCE($7, favorite_quote), \
                availability_days = COALESCE($8, availability_days), \
                availability_start = COALESCE($9, availability_start), \
                availability_end = COALESCE($10, availability_end), \
                updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(update.name)
            .bind(update.age)
            .bind(update.bio)
            .bind(update.skills)
            .bind(update.goals)
            .bind(update.favorite_quote)
            .bind(days)
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?
            .to_domain()
    }

    async fn list_users(&self, filter: UserFilter) -> PortResult<Vec<User>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        if let Some(id) = filter.id {
            query.push(" AND id = ").push_bind(id);
        }
        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(skill) = filter.skill {
            query.push(" AND ").push_bind(skill).push(" = ANY(skills)");
        }
        if let Some(needle) = filter.name_contains {
            query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(&needle)));
        }
        query.push(" ORDER BY created_at ASC");

        let records = query
            .build_query_as::<UserRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, UserRecord::to_domain)
    }

    async fn count_users(&self, role: Option<Role>) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)",
        )
        .bind(role.map(Role::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn create_request(
        &self,
        mentee_id: Uuid,
        mentor_id: Uuid,
        message: Option<String>,
    ) -> PortResult<MentorshipRequest> {
        let sql = format!(
            "INSERT INTO mentorship_requests (id, mentee_id, mentor_id, status, message) \
             VALUES ($1, $2, $3, 'pending', $4) RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(mentee_id)
            .bind(mentor_id)
            .bind(message)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn list_requests(&self, filter: RequestFilter) -> PortResult<Vec<MentorshipRequest>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REQUEST_COLUMNS} FROM mentorship_requests WHERE TRUE"
        ));
        if let Some(mentor_id) = filter.mentor_id {
            query.push(" AND mentor_id = ").push_bind(mentor_id);
        }
        if let Some(mentee_id) = filter.mentee_id {
            query.push(" AND mentee_id = ").push_bind(mentee_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let records = query
            .build_query_as::<RequestRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, RequestRecord::to_domain)
    }

    async fn get_request_for_mentor(
        &self,
        request_id: Uuid,
        mentor_id: Uuid,
    ) -> PortResult<MentorshipRequest> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM mentorship_requests WHERE id = $1 AND mentor_id = $2"
        );
        sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(request_id)
            .bind(mentor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Request {} not found", request_id)))?
            .to_domain()
    }

    async fn set_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> PortResult<MentorshipRequest> {
        let sql = format!(
            "UPDATE mentorship_requests SET status = $2, updated_at = now() \
             WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, RequestRecord>(&sql)
            .bind(request_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Request {} not found", request_id)))?
            .to_domain()
    }

    async fn create_session(&self, session: NewSession) -> PortResult<Session> {
        let sql = format!(
            "INSERT INTO sessions (id, mentor_id, mentee_id, date, time, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(session.mentor_id)
            .bind(session.mentee_id)
            .bind(session.date)
            .bind(session.time.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?
            .to_domain()
    }

    async fn find_session_at_slot(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        time: ClockTime,
    ) -> PortResult<Option<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE mentor_id = $1 AND date = $2 AND time = $3 LIMIT 1"
        );
        sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(mentor_id)
            .bind(date)
            .bind(time.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(SessionRecord::to_domain)
            .transpose()
    }

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<Session>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE TRUE"
        ));
        if let Some(mentor_id) = filter.mentor_id {
            query.push(" AND mentor_id = ").push_bind(mentor_id);
        }
        if let Some(mentee_id) = filter.mentee_id {
            query.push(" AND mentee_id = ").push_bind(mentee_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        // `time` is always stored as zero-padded HH:MM, so text order is time order.
        query.push(" ORDER BY date ASC, time ASC");

        let records = query
            .build_query_as::<SessionRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, SessionRecord::to_domain)
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
    ) -> PortResult<Session> {
        let sql = format!(
            "UPDATE sessions SET status = $2 WHERE id = $1 RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?
            .to_domain()
    }

    async fn delete_session(&self, session_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Session {} not found", session_id)));
        }
        Ok(())
    }
}
