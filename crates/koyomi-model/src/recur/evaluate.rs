//! Period-based recurrence expansion (RFC 5545 §3.3.10).
//!
//! [`RecurrenceRule::evaluate`] steps the anchor forward in coarse
//! `interval × frequency` periods and expands the by-field filters into
//! candidate instants confined to each period, honoring the RFC 5545
//! expand/limit table per frequency. The resulting iterator is lazy,
//! strictly ascending, deduplicated, and restartable: all state lives in
//! the iterator value, so identical inputs always produce identical
//! sequences.

use std::collections::VecDeque;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};

use koyomi_core::CalDateTime;

use crate::error::{ModelError, ModelResult};
use super::rule::{Frequency, RecurrenceRule, Weekday};

/// Consecutive candidate-free periods tolerated before a COUNT-only scan
/// stops.
///
/// Degenerate filter combinations (e.g. BYMONTHDAY=30;BYMONTH=2) never
/// match, and a rule bounded only by COUNT has no instant to stop at. A
/// scan with an UNTIL or horizon instead runs until the first period past
/// that bound, however sparse the filters.
const MAX_BARREN_PERIODS: u32 = 1024;

const END_OF_DAY: i64 = 24 * 3600 - 1;

impl RecurrenceRule {
    /// Evaluates the rule against an anchor instant.
    ///
    /// `horizon` is an exclusive upper bound on emitted instants. It is
    /// required when the rule has neither COUNT nor UNTIL; for
    /// self-bounding rules it may be `None`.
    ///
    /// The sequence preserves the anchor's form: date-only anchors yield
    /// date-only instants, zoned anchors re-attach their zone to each
    /// computed wall clock (earlier offset on DST folds; wall clocks that
    /// fall in a DST gap are skipped).
    ///
    /// ## Errors
    ///
    /// Returns [`ModelError::UnboundedRecurrence`] when the rule is not
    /// self-bounding and no horizon is supplied.
    pub fn evaluate<'a>(
        &'a self,
        anchor: &CalDateTime,
        horizon: Option<&CalDateTime>,
    ) -> ModelResult<RecurrenceIter<'a>> {
        if !self.is_finite() && horizon.is_none() {
            return Err(ModelError::UnboundedRecurrence);
        }

        tracing::trace!(rule = %self, anchor = %anchor, "evaluating recurrence rule");

        // A date-only UNTIL names a whole day; keep that day inclusive.
        let until_utc = self.until.as_ref().map(|u| {
            if u.is_date() {
                u.to_utc() + TimeDelta::seconds(END_OF_DAY)
            } else {
                u.to_utc()
            }
        });

        Ok(RecurrenceIter {
            rule: self,
            anchor: anchor.clone(),
            anchor_wall: anchor.naive_local(),
            anchor_utc: anchor.to_utc(),
            until_utc,
            horizon_utc: horizon.map(CalDateTime::to_utc),
            next_period: 0,
            barren_periods: 0,
            pending: VecDeque::new(),
            emitted: 0,
            last_utc: None,
            done: false,
        })
    }
}

/// One coarse recurrence period, identified by its calendar container.
#[derive(Debug, Clone, Copy)]
enum Period {
    Year(i32),
    Month { year: i32, month: u32 },
    /// Week-start-aligned first day of the week.
    Week(NaiveDate),
    Day(NaiveDate),
    /// Period start wall clock for sub-daily frequencies.
    Instant(NaiveDateTime),
}

/// Lazy ascending sequence of recurrence instants.
///
/// Produced by [`RecurrenceRule::evaluate`].
#[derive(Debug, Clone)]
pub struct RecurrenceIter<'a> {
    rule: &'a RecurrenceRule,
    anchor: CalDateTime,
    anchor_wall: NaiveDateTime,
    anchor_utc: DateTime<Utc>,
    until_utc: Option<DateTime<Utc>>,
    horizon_utc: Option<DateTime<Utc>>,
    next_period: u64,
    barren_periods: u32,
    pending: VecDeque<CalDateTime>,
    emitted: u32,
    last_utc: Option<DateTime<Utc>>,
    done: bool,
}

impl Iterator for RecurrenceIter<'_> {
    type Item = CalDateTime;

    fn next(&mut self) -> Option<CalDateTime> {
        loop {
            if let Some(count) = self.rule.count
                && self.emitted >= count
            {
                return None;
            }

            // A later period can reach back before this one's tail (week 1
            // of a year may start in the previous December), so hold the
            // head back until the next unexpanded period starts past it.
            while !self.done && self.head_must_wait() {
                self.fill_next_period();
            }

            let candidate = self.pending.pop_front()?;
            let utc = candidate.to_utc();

            if utc < self.anchor_utc {
                continue;
            }
            if let Some(last) = self.last_utc
                && utc <= last
            {
                continue;
            }
            // The buffer is globally sorted, so the first instant past a
            // bound ends the whole sequence.
            if let Some(until) = self.until_utc
                && utc > until
            {
                self.pending.clear();
                self.done = true;
                return None;
            }
            if let Some(horizon) = self.horizon_utc
                && utc >= horizon
            {
                self.pending.clear();
                self.done = true;
                return None;
            }
            self.emitted += 1;
            self.last_utc = Some(utc);
            return Some(candidate);
        }
    }
}

impl std::iter::FusedIterator for RecurrenceIter<'_> {}

impl RecurrenceIter<'_> {
    /// Whether the buffer head could still be preceded by an instant
    /// from a period that has not been expanded yet.
    fn head_must_wait(&self) -> bool {
        let Some(head) = self.pending.front() else {
            return true;
        };
        self.upcoming_floor()
            .is_some_and(|floor| floor <= head.to_utc())
    }

    /// Conservative lower bound on everything later periods can produce.
    fn upcoming_floor(&self) -> Option<DateTime<Utc>> {
        let period = self.period(self.next_period)?;
        Some(self.period_start(&period)?.to_utc())
    }

    /// Expands the next coarse period into `pending`.
    ///
    /// Marks the iterator done once the scan has moved past every bound
    /// or exhausted the barren-period allowance.
    fn fill_next_period(&mut self) {
        // The cap only guards COUNT-only rules; a scan with an UNTIL or
        // horizon stops at the first period past that bound instead.
        if self.scan_bound().is_none() && self.barren_periods > MAX_BARREN_PERIODS {
            self.done = true;
            return;
        }

        let n = self.next_period;
        self.next_period += 1;

        let Some(period) = self.period(n) else {
            self.done = true;
            return;
        };

        if let Some(bound) = self.scan_bound()
            && let Some(start) = self.period_start(&period)
            && start.to_utc() > bound
        {
            self.done = true;
            return;
        }

        let walls = self.expand_period(&period);
        let mut candidates: Vec<CalDateTime> = walls
            .into_iter()
            .filter_map(|w| self.anchor.with_wall_clock(w))
            .collect();
        candidates.sort();
        candidates.dedup();
        // BYSETPOS indexes the full period set, before the anchor floor.
        let candidates = apply_set_pos(&self.rule.by_set_pos, candidates);
        let candidates: Vec<_> = candidates
            .into_iter()
            .filter(|c| c.to_utc() >= self.anchor_utc)
            .collect();

        if candidates.is_empty() {
            self.barren_periods += 1;
        } else {
            self.barren_periods = 0;
        }
        self.pending.extend(candidates);
        self.pending.make_contiguous().sort_unstable();
    }

    /// Scanning may stop once a period starts past this instant.
    fn scan_bound(&self) -> Option<DateTime<Utc>> {
        match (self.until_utc, self.horizon_utc) {
            (Some(u), Some(h)) => Some(u.min(h)),
            (Some(b), None) | (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Computes the `n`-th coarse period from the anchor.
    fn period(&self, n: u64) -> Option<Period> {
        let steps = i64::try_from(n.checked_mul(u64::from(self.rule.interval))?).ok()?;
        let date = self.anchor_wall.date();

        Some(match self.rule.freq {
            Frequency::Yearly => {
                let year = i32::try_from(i64::from(date.year()).checked_add(steps)?).ok()?;
                Period::Year(year)
            }
            Frequency::Monthly => {
                let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + steps;
                let year = i32::try_from(total.div_euclid(12)).ok()?;
                let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
                Period::Month { year, month }
            }
            Frequency::Weekly => {
                let start = week_start_of(date, self.rule.week_start)?;
                Period::Week(start.checked_add_signed(TimeDelta::days(steps.checked_mul(7)?))?)
            }
            Frequency::Daily => Period::Day(date.checked_add_signed(TimeDelta::days(steps))?),
            Frequency::Hourly => {
                Period::Instant(self.anchor_wall.checked_add_signed(TimeDelta::hours(steps))?)
            }
            Frequency::Minutely => {
                Period::Instant(self.anchor_wall.checked_add_signed(TimeDelta::minutes(steps))?)
            }
            Frequency::Secondly => {
                Period::Instant(self.anchor_wall.checked_add_signed(TimeDelta::seconds(steps))?)
            }
        })
    }

    /// Earliest instant the period can produce, for the stop check.
    fn period_start(&self, period: &Period) -> Option<CalDateTime> {
        let wall = match *period {
            // BYWEEKNO week 1 may reach back into the previous December.
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1)?
                .checked_sub_signed(TimeDelta::days(7))?
                .and_time(NaiveTime::MIN),
            Period::Month { year, month } => {
                NaiveDate::from_ymd_opt(year, month, 1)?.and_time(NaiveTime::MIN)
            }
            Period::Week(start) => start.and_time(NaiveTime::MIN),
            Period::Day(d) => d.and_time(NaiveTime::MIN),
            Period::Instant(w) => w,
        };
        self.anchor.with_wall_clock(wall)
    }

    /// Expands one period into candidate wall clocks.
    fn expand_period(&self, period: &Period) -> Vec<NaiveDateTime> {
        match *period {
            Period::Year(year) => self.expand_times(&self.dates_in_year(year)),
            Period::Month { year, month } => self.expand_times(&self.dates_in_month(year, month)),
            Period::Week(start) => self.expand_times(&self.dates_in_week(start)),
            Period::Day(d) => {
                if self.date_passes_limits(d) {
                    self.expand_times(&[d])
                } else {
                    Vec::new()
                }
            }
            Period::Instant(w) => self.expand_instant(w),
        }
    }

    /// Candidate dates of a YEARLY period.
    ///
    /// BYYEARDAY and BYWEEKNO drive the selection when present, with
    /// BYMONTH and BYMONTHDAY narrowing that set; otherwise the month
    /// fields expand.
    fn dates_in_year(&self, year: i32) -> Vec<NaiveDate> {
        let rule = self.rule;
        let mut dates = Vec::new();

        if !rule.by_year_day.is_empty() || !rule.by_week_no.is_empty() {
            for &yd in &rule.by_year_day {
                dates.extend(yearday_date(year, yd));
            }
            for &wk in &rule.by_week_no {
                dates.extend(self.week_no_dates(year, wk));
            }
            if !rule.by_month.is_empty() {
                dates.retain(|d| rule.by_month.iter().any(|&m| u32::from(m) == d.month()));
            }
            if !rule.by_month_day.is_empty() {
                dates.retain(|d| monthday_matches(*d, &rule.by_month_day));
            }
            return dates;
        }

        if !rule.by_month.is_empty() {
            for &m in &rule.by_month {
                dates.extend(self.month_dates(year, u32::from(m)));
            }
        } else if !rule.by_month_day.is_empty() {
            for m in 1..=12 {
                dates.extend(month_days_from_list(year, m, &rule.by_month_day));
            }
        } else if !rule.by_day.is_empty() {
            for wd in &rule.by_day {
                let matching = weekdays_in_year(year, wd.weekday);
                match wd.ordinal {
                    Some(ord) => dates.extend(select_nth(&matching, ord)),
                    None => dates.extend(matching),
                }
            }
        } else {
            let anchor = self.anchor_wall.date();
            dates.extend(NaiveDate::from_ymd_opt(year, anchor.month(), anchor.day()));
        }

        dates
    }

    /// Candidate dates of a MONTHLY period (BYMONTH acts as a limit).
    fn dates_in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let rule = self.rule;
        if !rule.by_month.is_empty()
            && !rule.by_month.iter().any(|&m| u32::from(m) == month)
        {
            return Vec::new();
        }
        self.month_dates(year, month)
    }

    /// Expands BYMONTHDAY/BYDAY (or the anchor day) within one month.
    fn month_dates(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let rule = self.rule;

        if !rule.by_month_day.is_empty() {
            let mut days = month_days_from_list(year, month, &rule.by_month_day);
            if !rule.by_day.is_empty() {
                days.retain(|d| weekday_in(d, &rule.by_day));
            }
            return days;
        }

        if !rule.by_day.is_empty() {
            let mut days = Vec::new();
            for wd in &rule.by_day {
                let matching = weekdays_in_month(year, month, wd.weekday);
                match wd.ordinal {
                    Some(ord) => days.extend(select_nth(&matching, ord)),
                    None => days.extend(matching),
                }
            }
            return days;
        }

        // Invalid dates (e.g. Jan 31 pattern in February) are skipped.
        NaiveDate::from_ymd_opt(year, month, self.anchor_wall.day())
            .into_iter()
            .collect()
    }

    /// Candidate dates of a WEEKLY period.
    fn dates_in_week(&self, start: NaiveDate) -> Vec<NaiveDate> {
        let rule = self.rule;
        let anchor_weekday = Weekday::from_chrono(self.anchor_wall.weekday());

        (0..7)
            .filter_map(|i| start.checked_add_signed(TimeDelta::days(i)))
            .filter(|d| {
                if rule.by_day.is_empty() {
                    Weekday::from_chrono(d.weekday()) == anchor_weekday
                } else {
                    weekday_in(d, &rule.by_day)
                }
            })
            .filter(|d| {
                rule.by_month.is_empty()
                    || rule.by_month.iter().any(|&m| u32::from(m) == d.month())
            })
            .collect()
    }

    /// Days of a BYWEEKNO week, using the ≥4-days-in-year week-1 rule
    /// generalized to WKST.
    fn week_no_dates(&self, year: i32, week: i8) -> Vec<NaiveDate> {
        let rule = self.rule;
        let Some(w1) = week1_start(year, rule.week_start) else {
            return Vec::new();
        };
        let Some(w1_next) = week1_start(year + 1, rule.week_start) else {
            return Vec::new();
        };
        let total = (w1_next - w1).num_days() / 7;

        let index = if week > 0 {
            i64::from(week) - 1
        } else {
            total + i64::from(week)
        };
        if index < 0 || index >= total {
            return Vec::new();
        }
        let Some(start) = w1.checked_add_signed(TimeDelta::days(index * 7)) else {
            return Vec::new();
        };

        if rule.by_day.is_empty() {
            let offset = Weekday::from_chrono(self.anchor_wall.weekday()).days_from(rule.week_start);
            start
                .checked_add_signed(TimeDelta::days(i64::from(offset)))
                .into_iter()
                .collect()
        } else {
            rule.by_day
                .iter()
                .filter_map(|wd| {
                    let offset = wd.weekday.days_from(rule.week_start);
                    start.checked_add_signed(TimeDelta::days(i64::from(offset)))
                })
                .collect()
        }
    }

    /// Date-field limits applied at DAILY and sub-daily frequencies.
    fn date_passes_limits(&self, d: NaiveDate) -> bool {
        let rule = self.rule;
        if !rule.by_month.is_empty() && !rule.by_month.iter().any(|&m| u32::from(m) == d.month()) {
            return false;
        }
        if !rule.by_month_day.is_empty() && !monthday_matches(d, &rule.by_month_day) {
            return false;
        }
        if !rule.by_day.is_empty() && !weekday_in(&d, &rule.by_day) {
            return false;
        }
        true
    }

    /// Expands BYHOUR/BYMINUTE/BYSECOND across a list of candidate dates.
    fn expand_times(&self, dates: &[NaiveDate]) -> Vec<NaiveDateTime> {
        let rule = self.rule;
        let t = self.anchor_wall.time();
        let hours = pick_units(&rule.by_hour, t.hour());
        let minutes = pick_units(&rule.by_minute, t.minute());
        let seconds = pick_units(&rule.by_second, t.second());

        let mut out = Vec::new();
        for &d in dates {
            for &h in &hours {
                for &m in &minutes {
                    for &s in &seconds {
                        out.extend(d.and_hms_opt(h, m, s));
                    }
                }
            }
        }
        out
    }

    /// Sub-daily candidate generation: fields at or above the frequency
    /// act as limits, fields below expand.
    fn expand_instant(&self, wall: NaiveDateTime) -> Vec<NaiveDateTime> {
        let rule = self.rule;
        let d = wall.date();
        let t = wall.time();

        if !self.date_passes_limits(d) {
            return Vec::new();
        }
        if !rule.by_year_day.is_empty() {
            let yd = i64::from(d.ordinal());
            let total = i64::from(days_in_year(d.year()));
            let matched = rule
                .by_year_day
                .iter()
                .any(|&v| if v > 0 { i64::from(v) == yd } else { total + i64::from(v) + 1 == yd });
            if !matched {
                return Vec::new();
            }
        }
        if !rule.by_hour.is_empty() && !rule.by_hour.iter().any(|&h| u32::from(h) == t.hour()) {
            return Vec::new();
        }

        match rule.freq {
            Frequency::Hourly => {
                let minutes = pick_units(&rule.by_minute, t.minute());
                let seconds = pick_units(&rule.by_second, t.second());
                let mut out = Vec::new();
                for &m in &minutes {
                    for &s in &seconds {
                        out.extend(d.and_hms_opt(t.hour(), m, s));
                    }
                }
                out
            }
            Frequency::Minutely => {
                if !rule.by_minute.is_empty()
                    && !rule.by_minute.iter().any(|&m| u32::from(m) == t.minute())
                {
                    return Vec::new();
                }
                pick_units(&rule.by_second, t.second())
                    .into_iter()
                    .filter_map(|s| d.and_hms_opt(t.hour(), t.minute(), s))
                    .collect()
            }
            _ => {
                let minute_ok = rule.by_minute.is_empty()
                    || rule.by_minute.iter().any(|&m| u32::from(m) == t.minute());
                let second_ok = rule.by_second.is_empty()
                    || rule.by_second.iter().any(|&s| u32::from(s) == t.second());
                if minute_ok && second_ok {
                    vec![wall]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// Applies BYSETPOS to a period's sorted candidate list.
fn apply_set_pos(positions: &[i16], candidates: Vec<CalDateTime>) -> Vec<CalDateTime> {
    if positions.is_empty() || candidates.is_empty() {
        return candidates;
    }
    let len = candidates.len();
    let mut indexes: Vec<usize> = positions
        .iter()
        .filter_map(|&p| {
            if p > 0 {
                let i = usize::try_from(p).ok()?.checked_sub(1)?;
                (i < len).then_some(i)
            } else {
                len.checked_sub(usize::try_from(-i32::from(p)).ok()?)
            }
        })
        .collect();
    indexes.sort_unstable();
    indexes.dedup();
    indexes
        .into_iter()
        .filter_map(|i| candidates.get(i).cloned())
        .collect()
}

fn pick_units(list: &[u8], fallback: u32) -> Vec<u32> {
    if list.is_empty() {
        return vec![fallback];
    }
    let mut units: Vec<u32> = list.iter().map(|&v| u32::from(v)).collect();
    units.sort_unstable();
    units.dedup();
    units
}

fn weekday_in(d: &NaiveDate, list: &[super::rule::WeekdayNum]) -> bool {
    let wd = Weekday::from_chrono(d.weekday());
    list.iter().any(|w| w.weekday == wd)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map_or(31, |d| d.day())
}

fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31).map_or(365, |d| d.ordinal())
}

/// Resolves a BYMONTHDAY list within one month; out-of-range days drop out.
fn month_days_from_list(year: i32, month: u32, list: &[i8]) -> Vec<NaiveDate> {
    let len = days_in_month(year, month);
    list.iter()
        .filter_map(|&md| {
            let day = if md > 0 {
                u32::try_from(md).ok()?
            } else {
                u32::try_from(i64::from(len) + i64::from(md) + 1).ok()?
            };
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .collect()
}

fn monthday_matches(d: NaiveDate, list: &[i8]) -> bool {
    let day = i64::from(d.day());
    let len = i64::from(days_in_month(d.year(), d.month()));
    list.iter()
        .any(|&md| if md > 0 { i64::from(md) == day } else { len + i64::from(md) + 1 == day })
}

fn weekdays_in_month(year: i32, month: u32, wd: Weekday) -> Vec<NaiveDate> {
    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .filter(|d| Weekday::from_chrono(d.weekday()) == wd)
        .collect()
}

fn weekdays_in_year(year: i32, wd: Weekday) -> Vec<NaiveDate> {
    (1..=days_in_year(year))
        .filter_map(|o| NaiveDate::from_yo_opt(year, o))
        .filter(|d| Weekday::from_chrono(d.weekday()) == wd)
        .collect()
}

/// Selects the nth entry (1-based, negative counts from the end).
fn select_nth(dates: &[NaiveDate], ordinal: i8) -> Option<NaiveDate> {
    let index = if ordinal > 0 {
        usize::try_from(ordinal).ok()?.checked_sub(1)?
    } else {
        dates.len().checked_sub(usize::try_from(-i32::from(ordinal)).ok()?)?
    };
    dates.get(index).copied()
}

fn yearday_date(year: i32, yearday: i16) -> Option<NaiveDate> {
    let ordinal = if yearday > 0 {
        u32::try_from(yearday).ok()?
    } else {
        u32::try_from(i64::from(days_in_year(year)) + i64::from(yearday) + 1).ok()?
    };
    NaiveDate::from_yo_opt(year, ordinal)
}

/// First day of the week containing `date`, aligned to `week_start`.
fn week_start_of(date: NaiveDate, week_start: Weekday) -> Option<NaiveDate> {
    let offset = Weekday::from_chrono(date.weekday()).days_from(week_start);
    date.checked_sub_signed(TimeDelta::days(i64::from(offset)))
}

/// Start of week 1: the first week with at least four days in the year.
fn week1_start(year: i32, week_start: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = Weekday::from_chrono(jan1.weekday()).days_from(week_start);
    let start = jan1.checked_sub_signed(TimeDelta::days(i64::from(offset)))?;
    if 7 - offset >= 4 {
        Some(start)
    } else {
        start.checked_add_signed(TimeDelta::days(7))
    }
}
