//! crates/mentor_match_core/src/booking.rs
//!
//! Decides whether a proposed session booking is admissible.
//!
//! The validator is pure: callers load the mentor, the mentee, the accepted
//! request and any session already occupying the slot, and hand the results
//! over in a [`BookingContext`]. Checks run in a fixed order and the first
//! failure wins, so the error a client sees does not depend on which lookups
//! happened to be cheap.

use chrono::{Datelike, NaiveDate};

use crate::domain::{NewSession, Role, User};
use crate::schedule::ClockTime;

/// Coarse classification of a rejected booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingErrorKind {
    NotFound,
    Forbidden,
    InvalidInput,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Mentor not found.")]
    MentorNotFound,
    #[error("Mentee not found.")]
    MenteeNotFound,
    #[error("Mentor has not accepted this mentee.")]
    NotAccepted,
    #[error("Mentor has not set availability.")]
    AvailabilityUnset,
    #[error("Requested day is not in mentor availability.")]
    DayUnavailable,
    #[error("Requested time is outside mentor availability.")]
    OutsideHours,
    #[error("Mentor already has a session at this time.")]
    SlotTaken,
}

impl BookingError {
    pub fn kind(self) -> BookingErrorKind {
        match self {
            BookingError::MentorNotFound | BookingError::MenteeNotFound => {
                BookingErrorKind::NotFound
            }
            BookingError::NotAccepted => BookingErrorKind::Forbidden,
            BookingError::AvailabilityUnset
            | BookingError::DayUnavailable
            | BookingError::OutsideHours => BookingErrorKind::InvalidInput,
            BookingError::SlotTaken => BookingErrorKind::Conflict,
        }
    }
}

/// Everything the validator needs to know about a candidate booking.
#[derive(Debug, Clone)]
pub struct BookingContext<'a> {
    pub mentor: Option<&'a User>,
    pub mentee: Option<&'a User>,
    pub accepted_request_exists: bool,
    pub date: NaiveDate,
    pub time: ClockTime,
    /// Whether any session, whatever its status, already sits at
    /// (mentor, date, time).
    pub existing_session_at_slot: bool,
}

/// Runs every booking check and returns the session to persist.
pub fn validate_booking(ctx: &BookingContext<'_>) -> Result<NewSession, BookingError> {
    let mentor = ctx
        .mentor
        .filter(|u| u.is(Role::Mentor))
        .ok_or(BookingError::MentorNotFound)?;
    let mentee = ctx
        .mentee
        .filter(|u| u.is(Role::Mentee))
        .ok_or(BookingError::MenteeNotFound)?;

    if !ctx.accepted_request_exists {
        return Err(BookingError::NotAccepted);
    }

    let availability = mentor
        .availability
        .as_ref()
        .ok_or(BookingError::AvailabilityUnset)?;

    if !availability.is_open_on(ctx.date.weekday()) {
        return Err(BookingError::DayUnavailable);
    }
    if !availability.covers(ctx.time) {
        return Err(BookingError::OutsideHours);
    }

    // Cancelled sessions still hold their slot.
    if ctx.existing_session_at_slot {
        return Err(BookingError::SlotTaken);
    }

    Ok(NewSession {
        mentor_id: mentor.id,
        mentee_id: mentee.id,
        date: ctx.date,
        time: ctx.time,
    })
}
