//! Recurrence rule value type (RFC 5545 §3.3.10).
//!
//! A [`RecurrenceRule`] is immutable once constructed and is validated at
//! construction: COUNT/UNTIL exclusivity, positive interval, and every
//! by-field range are checked by [`RecurrenceRuleBuilder::build`], never
//! during iteration.

use std::fmt;

use serde::{Deserialize, Serialize};

use koyomi_core::CalDateTime;

use crate::error::{ModelError, ModelResult};

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }

    pub(crate) const fn from_chrono(wd: chrono::Weekday) -> Self {
        match wd {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }

    /// Days from `week_start` to `self`, in 0..7.
    pub(crate) const fn days_from(self, week_start: Self) -> u32 {
        (self.number_from_sunday() + 7 - week_start.number_from_sunday()) % 7
    }

    const fn number_from_sunday(self) -> u32 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekday with optional occurrence number, used in BYDAY.
///
/// Examples: `MO` (every Monday), `1MO` (first Monday of the month/year),
/// `-1FR` (last Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal.
    ///
    /// The ordinal range is validated by [`RecurrenceRuleBuilder::build`].
    #[must_use]
    pub const fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// Recurrence rule, immutable once built.
///
/// Construct through [`RecurrenceRule::builder`] or the per-frequency
/// shorthands ([`RecurrenceRule::daily`], ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub(crate) freq: Frequency,
    pub(crate) interval: u32,
    pub(crate) count: Option<u32>,
    pub(crate) until: Option<CalDateTime>,
    pub(crate) week_start: Weekday,
    pub(crate) by_second: Vec<u8>,
    pub(crate) by_minute: Vec<u8>,
    pub(crate) by_hour: Vec<u8>,
    pub(crate) by_day: Vec<WeekdayNum>,
    pub(crate) by_month_day: Vec<i8>,
    pub(crate) by_year_day: Vec<i16>,
    pub(crate) by_week_no: Vec<i8>,
    pub(crate) by_month: Vec<u8>,
    pub(crate) by_set_pos: Vec<i16>,
}

impl RecurrenceRule {
    /// Starts a builder for the given frequency.
    #[must_use]
    pub fn builder(freq: Frequency) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(freq)
    }

    /// Starts a daily-rule builder.
    #[must_use]
    pub fn daily() -> RecurrenceRuleBuilder {
        Self::builder(Frequency::Daily)
    }

    /// Starts a weekly-rule builder.
    #[must_use]
    pub fn weekly() -> RecurrenceRuleBuilder {
        Self::builder(Frequency::Weekly)
    }

    /// Starts a monthly-rule builder.
    #[must_use]
    pub fn monthly() -> RecurrenceRuleBuilder {
        Self::builder(Frequency::Monthly)
    }

    /// Starts a yearly-rule builder.
    #[must_use]
    pub fn yearly() -> RecurrenceRuleBuilder {
        Self::builder(Frequency::Yearly)
    }

    /// The rule's frequency.
    #[must_use]
    pub const fn freq(&self) -> Frequency {
        self.freq
    }

    /// The recurrence interval (>= 1).
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// The COUNT bound, if any.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        self.count
    }

    /// The UNTIL bound (inclusive), if any.
    #[must_use]
    pub const fn until(&self) -> Option<&CalDateTime> {
        self.until.as_ref()
    }

    /// The configured week start (WKST).
    #[must_use]
    pub const fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Whether the rule bounds itself via COUNT or UNTIL.
    ///
    /// Unbounded rules require a caller-supplied horizon for evaluation.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: ToString>(name: &str, values: &[T], parts: &mut Vec<String>) {
            if !values.is_empty() {
                let s: Vec<_> = values.iter().map(ToString::to_string).collect();
                parts.push(format!("{name}={}", s.join(",")));
            }
        }

        let mut parts = vec![format!("FREQ={}", self.freq)];

        if self.interval != 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }
        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }
        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }
        if self.week_start != Weekday::Monday {
            parts.push(format!("WKST={}", self.week_start));
        }

        list("BYSECOND", &self.by_second, &mut parts);
        list("BYMINUTE", &self.by_minute, &mut parts);
        list("BYHOUR", &self.by_hour, &mut parts);
        list("BYDAY", &self.by_day, &mut parts);
        list("BYMONTHDAY", &self.by_month_day, &mut parts);
        list("BYYEARDAY", &self.by_year_day, &mut parts);
        list("BYWEEKNO", &self.by_week_no, &mut parts);
        list("BYMONTH", &self.by_month, &mut parts);
        list("BYSETPOS", &self.by_set_pos, &mut parts);

        f.write_str(&parts.join(";"))
    }
}

/// Builder for [`RecurrenceRule`].
///
/// `build` performs all validation, so a successfully built rule can be
/// evaluated without further checks.
#[derive(Debug, Clone)]
pub struct RecurrenceRuleBuilder {
    rule: RecurrenceRule,
}

impl RecurrenceRuleBuilder {
    fn new(freq: Frequency) -> Self {
        Self {
            rule: RecurrenceRule {
                freq,
                interval: 1,
                count: None,
                until: None,
                week_start: Weekday::Monday,
                by_second: Vec::new(),
                by_minute: Vec::new(),
                by_hour: Vec::new(),
                by_day: Vec::new(),
                by_month_day: Vec::new(),
                by_year_day: Vec::new(),
                by_week_no: Vec::new(),
                by_month: Vec::new(),
                by_set_pos: Vec::new(),
            },
        }
    }

    /// Sets the interval.
    #[must_use]
    pub fn interval(mut self, interval: u32) -> Self {
        self.rule.interval = interval;
        self
    }

    /// Sets the COUNT bound.
    #[must_use]
    pub fn count(mut self, count: u32) -> Self {
        self.rule.count = Some(count);
        self
    }

    /// Sets the UNTIL bound (inclusive).
    #[must_use]
    pub fn until(mut self, until: CalDateTime) -> Self {
        self.rule.until = Some(until);
        self
    }

    /// Sets the week start (WKST).
    #[must_use]
    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.rule.week_start = week_start;
        self
    }

    /// Sets the BYSECOND list.
    #[must_use]
    pub fn by_second(mut self, seconds: Vec<u8>) -> Self {
        self.rule.by_second = seconds;
        self
    }

    /// Sets the BYMINUTE list.
    #[must_use]
    pub fn by_minute(mut self, minutes: Vec<u8>) -> Self {
        self.rule.by_minute = minutes;
        self
    }

    /// Sets the BYHOUR list.
    #[must_use]
    pub fn by_hour(mut self, hours: Vec<u8>) -> Self {
        self.rule.by_hour = hours;
        self
    }

    /// Sets the BYDAY list.
    #[must_use]
    pub fn by_day(mut self, days: Vec<WeekdayNum>) -> Self {
        self.rule.by_day = days;
        self
    }

    /// Sets the BYMONTHDAY list.
    #[must_use]
    pub fn by_month_day(mut self, days: Vec<i8>) -> Self {
        self.rule.by_month_day = days;
        self
    }

    /// Sets the BYYEARDAY list.
    #[must_use]
    pub fn by_year_day(mut self, days: Vec<i16>) -> Self {
        self.rule.by_year_day = days;
        self
    }

    /// Sets the BYWEEKNO list.
    #[must_use]
    pub fn by_week_no(mut self, weeks: Vec<i8>) -> Self {
        self.rule.by_week_no = weeks;
        self
    }

    /// Sets the BYMONTH list.
    #[must_use]
    pub fn by_month(mut self, months: Vec<u8>) -> Self {
        self.rule.by_month = months;
        self
    }

    /// Sets the BYSETPOS list.
    #[must_use]
    pub fn by_set_pos(mut self, positions: Vec<i16>) -> Self {
        self.rule.by_set_pos = positions;
        self
    }

    /// Validates and builds the rule.
    ///
    /// ## Errors
    ///
    /// Returns [`ModelError::InvalidRecurrenceRule`] when COUNT and UNTIL
    /// are both set, the interval or count is non-positive, or any by-field
    /// value is out of its RFC 5545 range.
    pub fn build(self) -> ModelResult<RecurrenceRule> {
        let rule = self.rule;

        if rule.count.is_some() && rule.until.is_some() {
            return Err(invalid("COUNT and UNTIL are mutually exclusive"));
        }
        if rule.interval == 0 {
            return Err(invalid("INTERVAL must be positive"));
        }
        if rule.count == Some(0) {
            return Err(invalid("COUNT must be positive"));
        }

        check_range("BYSECOND", &rule.by_second, |&s| s <= 60)?;
        check_range("BYMINUTE", &rule.by_minute, |&m| m <= 59)?;
        check_range("BYHOUR", &rule.by_hour, |&h| h <= 23)?;
        check_range("BYMONTH", &rule.by_month, |&m| (1..=12).contains(&m))?;
        check_range("BYMONTHDAY", &rule.by_month_day, |&d| {
            d != 0 && (-31..=31).contains(&d)
        })?;
        check_range("BYYEARDAY", &rule.by_year_day, |&d| {
            d != 0 && (-366..=366).contains(&d)
        })?;
        check_range("BYWEEKNO", &rule.by_week_no, |&w| {
            w != 0 && (-53..=53).contains(&w)
        })?;
        check_range("BYSETPOS", &rule.by_set_pos, |&p| {
            p != 0 && (-366..=366).contains(&p)
        })?;
        check_range("BYDAY", &rule.by_day, |wd| {
            wd.ordinal.is_none_or(|o| o != 0 && (-53..=53).contains(&o))
        })?;

        Ok(rule)
    }
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::InvalidRecurrenceRule(msg.into())
}

fn check_range<T: fmt::Debug>(
    name: &str,
    values: &[T],
    ok: impl Fn(&T) -> bool,
) -> ModelResult<()> {
    match values.iter().find(|v| !ok(v)) {
        Some(bad) => Err(invalid(format!("{name} value {bad:?} out of range"))),
        None => Ok(()),
    }
}
