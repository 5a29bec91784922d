//! Occurrence expansion: from a component and a query range to the
//! concrete occurrences inside it.
//!
//! - `occurrence`: the read-delegating, write-isolated [`Occurrence`]
//!   flyweight
//! - [`Occurrences`]: the lazy expansion iterator behind
//!   [`Schedulable::occurrences`]

use std::iter::Peekable;

use chrono::{DateTime, TimeDelta, Utc};

use koyomi_core::{CalDateTime, Timespan};

use crate::component::{CalendarComponent, Schedulable};
use crate::error::{ModelError, ModelResult};
use crate::recur::RecurrenceIter;

pub mod occurrence;

pub use occurrence::Occurrence;

/// Lazy sequence of a component's occurrences within a query range.
///
/// The component's own pair is always the first item, regardless of range
/// intersection or EXDATE. After it, recurrence-rule instants and RDATE
/// additions are merged in strictly ascending order, deduplicated by
/// normalized instant, EXDATE matches removed, each instant paired with
/// `start + duration`, and only pairs intersecting the range survive.
///
/// Pull-driven and single-threaded; dropping the iterator is the only
/// cancellation. Independent expansions share nothing but the immutable
/// master.
pub struct Occurrences<'a, C: CalendarComponent> {
    master: &'a C,
    range: Timespan,
    master_span: Timespan,
    duration: TimeDelta,
    rule: Option<Peekable<RecurrenceIter<'a>>>,
    rdates: &'a [CalDateTime],
    rdate_idx: usize,
    exdates: &'a [CalDateTime],
    emitted_master: bool,
    last: Option<DateTime<Utc>>,
    done: bool,
}

impl<'a, C: CalendarComponent> Occurrences<'a, C> {
    pub(crate) fn new(master: &'a C, range: &Timespan) -> ModelResult<Self> {
        let master_span = master.timespan()?;
        let duration = master
            .computed_duration()
            .ok_or(ModelError::UnresolvedTimespan { kind: master.kind() })?;

        // The range end bounds the rule, so even a COUNT-less, UNTIL-less
        // rule evaluates cleanly here.
        let rule = master
            .core()
            .rrule()
            .map(|rule| rule.evaluate(master_span.begin(), Some(range.end())))
            .transpose()?
            .map(Iterator::peekable);

        tracing::debug!(
            kind = %master.kind(),
            range = %range,
            recurring = rule.is_some(),
            "expanding occurrences"
        );

        Ok(Self {
            master,
            range: range.clone(),
            master_span,
            duration,
            rule,
            rdates: master.core().rdates(),
            rdate_idx: 0,
            exdates: master.core().exdates(),
            emitted_master: false,
            last: None,
            done: false,
        })
    }

    /// Next instant from the merged rule/RDATE streams, ascending.
    fn next_instant(&mut self) -> Option<CalDateTime> {
        let rdate = self.rdates.get(self.rdate_idx);
        let from_rule = self
            .rule
            .as_mut()
            .and_then(Peekable::peek)
            .map(CalDateTime::to_utc);

        match (rdate, from_rule) {
            (Some(rd), Some(ru)) if rd.to_utc() <= ru => {
                self.rdate_idx += 1;
                Some(rd.clone())
            }
            (_, Some(_)) => self.rule.as_mut().and_then(Iterator::next),
            (Some(rd), None) => {
                self.rdate_idx += 1;
                Some(rd.clone())
            }
            (None, None) => None,
        }
    }
}

impl<'a, C: CalendarComponent> Iterator for Occurrences<'a, C> {
    type Item = Occurrence<'a, C>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.emitted_master {
            self.emitted_master = true;
            return Some(Occurrence::new(self.master, self.master_span.clone()));
        }

        loop {
            let Some(start) = self.next_instant() else {
                self.done = true;
                return None;
            };
            let utc = start.to_utc();

            if let Some(last) = self.last
                && utc <= last
            {
                continue;
            }
            self.last = Some(utc);

            // Both streams are ascending, so nothing later can intersect.
            if utc >= self.range.end().to_utc() {
                self.done = true;
                return None;
            }
            // The master's own start was already emitted unconditionally.
            if start == *self.master_span.begin() {
                continue;
            }
            if self.exdates.binary_search(&start).is_ok() {
                continue;
            }

            let Some(end) = start.checked_add(self.duration) else {
                continue;
            };
            let Some(span) = Timespan::new(start, end) else {
                continue;
            };
            if span.intersects(&self.range) {
                return Some(Occurrence::new(self.master, span));
            }
        }
    }
}

impl<C: CalendarComponent> std::iter::FusedIterator for Occurrences<'_, C> {}
