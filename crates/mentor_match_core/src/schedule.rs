//! crates/mentor_match_core/src/schedule.rs
//!
//! Time-of-day and weekly availability primitives used by profiles and the
//! booking validator.

use chrono::Weekday;
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Weekday Naming
//=========================================================================================

/// Returns the English name of a weekday ("Monday" .. "Sunday").
///
/// Unlike `Weekday`'s `Display` impl this never abbreviates, and it does not
/// depend on any locale.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses a full English weekday name, ignoring ASCII case.
pub fn parse_weekday_name(name: &str) -> Option<Weekday> {
    const DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    let name = name.trim();
    DAYS.into_iter()
        .find(|day| weekday_name(*day).eq_ignore_ascii_case(name))
}

//=========================================================================================
// ClockTime
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid HH:MM time")]
pub struct InvalidClockTime(pub String);

/// A wall-clock time of day with minute precision, stored as minutes since
/// midnight. Parses from `H:MM` or `HH:MM` and always renders as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(hour * 60 + minute))
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl FromStr for ClockTime {
    type Err = InvalidClockTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidClockTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;

        let is_digits = |part: &str, min_len: usize| {
            (min_len..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !is_digits(hour, 1) || !is_digits(minute, 2) {
            return Err(invalid());
        }

        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

//=========================================================================================
// Availability
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("'{0}' is not a day of the week")]
    UnknownDay(String),
    #[error(transparent)]
    InvalidTime(#[from] InvalidClockTime),
    #[error("Start time must not be after end time")]
    InvertedWindow,
}

/// A mentor's weekly availability: a set of weekdays plus one daily window.
/// Both ends of the window are bookable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub days: Vec<Weekday>,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl Availability {
    /// Builds an availability from its textual form, as submitted by a profile
    /// form or read back from storage. Duplicate days are collapsed.
    pub fn parse<S: AsRef<str>>(
        days: &[S],
        start_time: &str,
        end_time: &str,
    ) -> Result<Self, AvailabilityError> {
        let mut parsed_days = Vec::with_capacity(days.len());
        for day in days {
            let day = day.as_ref();
            let weekday = parse_weekday_name(day)
                .ok_or_else(|| AvailabilityError::UnknownDay(day.to_string()))?;
            if !parsed_days.contains(&weekday) {
                parsed_days.push(weekday);
            }
        }

        let start_time: ClockTime = start_time.parse()?;
        let end_time: ClockTime = end_time.parse()?;
        if start_time > end_time {
            return Err(AvailabilityError::InvertedWindow);
        }

        Ok(Self {
            days: parsed_days,
            start_time,
            end_time,
        })
    }

    pub fn day_names(&self) -> Vec<String> {
        self.days.iter().map(|d| weekday_name(*d).to_string()).collect()
    }

    pub fn is_open_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Whether `time` falls inside the daily window, both ends inclusive.
    pub fn covers(&self, time: ClockTime) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}
