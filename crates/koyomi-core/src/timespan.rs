//! Half-open interval of calendar instants.

use std::fmt;

use chrono::TimeDelta;

use crate::datetime::CalDateTime;

/// A `[begin, end)` interval between two calendar instants.
///
/// This is the caller's query-range type as well as the interval shape of
/// a single occurrence. Zero-length spans are valid and behave as points
/// for intersection queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timespan {
    begin: CalDateTime,
    end: CalDateTime,
}

impl Timespan {
    /// Creates a timespan. Returns `None` when `begin > end`.
    #[must_use]
    pub fn new(begin: CalDateTime, end: CalDateTime) -> Option<Self> {
        if begin > end {
            return None;
        }
        Some(Self { begin, end })
    }

    /// Start of the interval (inclusive).
    #[must_use]
    pub const fn begin(&self) -> &CalDateTime {
        &self.begin
    }

    /// End of the interval (exclusive).
    #[must_use]
    pub const fn end(&self) -> &CalDateTime {
        &self.end
    }

    /// Returns whether the instant falls within `[begin, end)`.
    #[must_use]
    pub fn contains(&self, instant: &CalDateTime) -> bool {
        *instant >= self.begin && *instant < self.end
    }

    /// Returns whether two intervals overlap.
    ///
    /// Zero-length spans are treated as points: a point intersects an
    /// interval that contains it.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let (a0, a1) = (self.begin.to_utc(), self.end.to_utc());
        let (b0, b1) = (other.begin.to_utc(), other.end.to_utc());
        if a0 == a1 {
            return b0 <= a0 && a0 < b1;
        }
        if b0 == b1 {
            return a0 <= b0 && b0 < a1;
        }
        a0 < b1 && b0 < a1
    }

    /// Length of the interval.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end.to_utc() - self.begin.to_utc()
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(day: u32, hour: u32) -> CalDateTime {
        CalDateTime::utc(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn span(d0: u32, h0: u32, d1: u32, h1: u32) -> Timespan {
        Timespan::new(utc(d0, h0), utc(d1, h1)).unwrap()
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(Timespan::new(utc(2, 0), utc(1, 0)).is_none());
    }

    #[test]
    fn contains_is_half_open() {
        let s = span(1, 0, 2, 0);
        assert!(s.contains(&utc(1, 0)));
        assert!(s.contains(&utc(1, 23)));
        assert!(!s.contains(&utc(2, 0)));
    }

    #[test]
    fn overlap_detection() {
        assert!(span(1, 0, 3, 0).intersects(&span(2, 0, 4, 0)));
        assert!(!span(1, 0, 2, 0).intersects(&span(2, 0, 3, 0)));
    }

    #[test]
    fn zero_length_span_acts_as_point() {
        let point = Timespan::new(utc(2, 12), utc(2, 12)).unwrap();
        assert!(point.intersects(&span(2, 0, 3, 0)));
        assert!(span(2, 0, 3, 0).intersects(&point));
        assert!(!point.intersects(&span(3, 0, 4, 0)));
    }

    #[test]
    fn duration_is_interval_length() {
        assert_eq!(span(1, 0, 2, 0).duration(), TimeDelta::days(1));
    }
}
