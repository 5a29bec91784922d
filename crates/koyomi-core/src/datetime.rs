//! Calendar instant value (RFC 5545 §3.3.4, §3.3.5).
//!
//! A [`CalDateTime`] is an already-resolved instant as handed over by the
//! parsing collaborator: the zone identifier has been looked up, so a zoned
//! value carries its [`chrono_tz::Tz`] directly. Ordering and equality are
//! by normalized UTC instant, never by interval overlap.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// A resolved calendar instant in one of the four RFC 5545 forms.
#[derive(Debug, Clone)]
pub enum CalDateTime {
    /// DATE value - a calendar date without a time component.
    Date(NaiveDate),
    /// Floating DATE-TIME - same wall clock in any timezone.
    Floating(NaiveDateTime),
    /// UTC DATE-TIME - absolute instant ('Z' suffix).
    Utc(DateTime<Utc>),
    /// Zoned DATE-TIME - local time in a resolved IANA timezone.
    Zoned(DateTime<Tz>),
}

impl CalDateTime {
    /// Creates a date-only instant. Returns `None` for an invalid calendar date.
    #[must_use]
    pub fn date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::Date)
    }

    /// Creates a floating instant. Returns `None` for invalid components.
    #[must_use]
    pub fn floating(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)
            .map(Self::Floating)
    }

    /// Creates a UTC instant. Returns `None` for invalid components.
    #[must_use]
    pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .map(Self::Utc)
    }

    /// Creates a zoned instant from local wall-clock components.
    ///
    /// A DST fold resolves to the earlier offset (RFC 5545 §3.3.5); a DST
    /// gap yields `None`.
    #[must_use]
    pub fn zoned(tz: Tz, year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<Self> {
        let wall = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
        tz.from_local_datetime(&wall).earliest().map(Self::Zoned)
    }

    /// Returns whether this is a date-only value.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Normalizes to a UTC instant.
    ///
    /// Date-only values count as midnight; floating values are read as if
    /// UTC, which makes comparisons across forms deterministic.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Date(d) => Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)),
            Self::Floating(dt) => Utc.from_utc_datetime(dt),
            Self::Utc(dt) => *dt,
            Self::Zoned(dt) => dt.with_timezone(&Utc),
        }
    }

    /// Returns the local wall clock of this instant.
    #[must_use]
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN),
            Self::Floating(dt) => *dt,
            Self::Utc(dt) => dt.naive_utc(),
            Self::Zoned(dt) => dt.naive_local(),
        }
    }

    /// Rebuilds an instant of the same form from a shifted wall clock.
    ///
    /// For zoned values a DST fold resolves to the earlier offset; a wall
    /// clock that falls in a DST gap yields `None`.
    #[must_use]
    pub fn with_wall_clock(&self, wall: NaiveDateTime) -> Option<Self> {
        match self {
            Self::Date(_) => Some(Self::Date(wall.date())),
            Self::Floating(_) => Some(Self::Floating(wall)),
            Self::Utc(_) => Some(Self::Utc(Utc.from_utc_datetime(&wall))),
            Self::Zoned(dt) => dt
                .timezone()
                .from_local_datetime(&wall)
                .earliest()
                .map(Self::Zoned),
        }
    }

    /// Adds a duration, preserving the form where possible.
    ///
    /// A date-only value stays date-only for whole-day durations and is
    /// promoted to floating otherwise. Returns `None` on overflow.
    #[must_use]
    pub fn checked_add(&self, delta: TimeDelta) -> Option<Self> {
        match self {
            Self::Date(d) => {
                if delta.num_seconds() % SECONDS_PER_DAY == 0 {
                    d.checked_add_signed(delta).map(Self::Date)
                } else {
                    d.and_time(NaiveTime::MIN)
                        .checked_add_signed(delta)
                        .map(Self::Floating)
                }
            }
            Self::Floating(dt) => dt.checked_add_signed(delta).map(Self::Floating),
            Self::Utc(dt) => dt.checked_add_signed(delta).map(Self::Utc),
            Self::Zoned(dt) => dt.checked_add_signed(delta).map(Self::Zoned),
        }
    }

    /// Returns the signed distance to another instant.
    #[must_use]
    pub fn signed_duration_since(&self, other: &Self) -> TimeDelta {
        self.to_utc() - other.to_utc()
    }

    /// Returns the year of the local wall clock.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.naive_local().year()
    }
}

impl From<NaiveDate> for CalDateTime {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for CalDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Floating(dt)
    }
}

impl From<DateTime<Utc>> for CalDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Utc(dt)
    }
}

impl From<DateTime<Tz>> for CalDateTime {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Zoned(dt)
    }
}

impl PartialEq for CalDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.to_utc() == other.to_utc()
    }
}

impl Eq for CalDateTime {}

impl PartialOrd for CalDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalDateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc().cmp(&other.to_utc())
    }
}

impl Hash for CalDateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_utc().hash(state);
    }
}

impl fmt::Display for CalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::Floating(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%S")),
            Self::Utc(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%SZ")),
            Self::Zoned(dt) => {
                write!(f, "TZID={}:{}", dt.timezone().name(), dt.format("%Y%m%dT%H%M%S"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_equality_across_forms() {
        let utc = CalDateTime::utc(2024, 1, 15, 15, 0, 0).unwrap();
        let zoned = CalDateTime::zoned(chrono_tz::America::New_York, 2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(utc, zoned);
    }

    #[test]
    fn date_counts_as_midnight() {
        let date = CalDateTime::date(2024, 1, 15).unwrap();
        let midnight = CalDateTime::utc(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(date, midnight);
        assert!(date < CalDateTime::utc(2024, 1, 15, 0, 0, 1).unwrap());
    }

    #[test]
    fn checked_add_keeps_date_form_for_whole_days() {
        let date = CalDateTime::date(2024, 1, 31).unwrap();
        let next = date.checked_add(TimeDelta::days(1)).unwrap();
        assert!(next.is_date());
        assert_eq!(next, CalDateTime::date(2024, 2, 1).unwrap());
    }

    #[test]
    fn checked_add_promotes_date_to_floating() {
        let date = CalDateTime::date(2024, 1, 1).unwrap();
        let shifted = date.checked_add(TimeDelta::hours(1)).unwrap();
        assert!(!shifted.is_date());
        assert_eq!(shifted, CalDateTime::floating(2024, 1, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn zoned_add_crosses_dst() {
        // US spring-forward 2024-03-10: wall clock jumps 02:00 -> 03:00.
        let before = CalDateTime::zoned(chrono_tz::America::New_York, 2024, 3, 9, 12, 0, 0).unwrap();
        let after = before.checked_add(TimeDelta::days(1)).unwrap();
        // Instant arithmetic: 24h later is 13:00 wall clock.
        assert_eq!(after.naive_local().time(), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
    }

    #[test]
    fn dst_gap_wall_clock_is_rejected() {
        let anchor = CalDateTime::zoned(chrono_tz::America::New_York, 2024, 1, 1, 2, 30, 0).unwrap();
        let gap = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(anchor.with_wall_clock(gap).is_none());
    }

    #[test]
    fn display_forms() {
        assert_eq!(CalDateTime::date(2024, 1, 5).unwrap().to_string(), "20240105");
        assert_eq!(
            CalDateTime::utc(2024, 1, 5, 9, 30, 0).unwrap().to_string(),
            "20240105T093000Z"
        );
        assert_eq!(
            CalDateTime::floating(2024, 1, 5, 9, 30, 0).unwrap().to_string(),
            "20240105T093000"
        );
    }
}
