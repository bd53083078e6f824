//! Where "today" comes from.
//!
//! Anything that depends on the current date takes a [Clock] instead of reading
//! the system time, so date boundaries can be pinned in tests.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// A source for the current calendar date.
pub trait Clock {
    /// The current date in the user's timezone.
    fn today(&self) -> Date;
}

/// A clock that reads the system time and converts it to a local timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: &'static Tz,
}

impl SystemClock {
    /// Create a clock for a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezoneError] if the name is not a known timezone.
    pub fn new(canonical_timezone: &str) -> Result<Self, Error> {
        time_tz::timezones::get_by_name(canonical_timezone)
            .map(|timezone| Self { timezone })
            .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
    }

    /// The UTC offset of the timezone at the current instant.
    pub fn local_offset(&self) -> UtcOffset {
        self.timezone
            .get_offset_utc(&OffsetDateTime::now_utc())
            .to_utc()
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc()
            .to_offset(self.local_offset())
            .date()
    }
}

/// A clock that is stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
