pub mod access;
pub mod booking;
pub mod domain;
pub mod ports;
pub mod schedule;

pub use access::{AccessDenied, Caller, Rule};
pub use booking::{validate_booking, BookingContext, BookingError, BookingErrorKind};
pub use domain::{
    MentorshipRequest, NewSession, NewUser, ProfileUpdate, RequestFilter, RequestStatus, Role,
    Session, SessionFilter, SessionStatus, SiteStats, TransitionError, User, UserCredentials,
    UserFilter,
};
pub use ports::{DatabaseService, PortError, PortResult, PortResultExt};
pub use schedule::{Availability, AvailabilityError, ClockTime};
