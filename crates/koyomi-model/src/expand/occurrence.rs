//! Single-occurrence flyweight.

use koyomi_core::{CalDateTime, Timespan};

use crate::component::{CalendarComponent, Schedulable};
use crate::error::ModelResult;
use crate::recur::RecurrenceRule;

/// One concrete occurrence of a recurring component.
///
/// Carries only its own `[start, end)` interval and a borrow of the
/// component it was expanded from; every other readable property forwards
/// to that master by direct delegation. Local writes ([`set_summary`],
/// [`set_comments`]) shadow the master's value for this instance only and
/// never propagate back.
///
/// Occurrences are ephemeral: they are produced during expansion and
/// cannot outlive the master borrow.
///
/// [`set_summary`]: Occurrence::set_summary
/// [`set_comments`]: Occurrence::set_comments
#[derive(Debug, Clone)]
pub struct Occurrence<'a, C> {
    master: &'a C,
    span: Timespan,
    summary: Option<String>,
    comments: Option<Vec<String>>,
}

impl<'a, C: CalendarComponent> Occurrence<'a, C> {
    pub(crate) const fn new(master: &'a C, span: Timespan) -> Self {
        Self {
            master,
            span,
            summary: None,
            comments: None,
        }
    }

    /// Start of this occurrence (inclusive).
    #[must_use]
    pub const fn start(&self) -> &CalDateTime {
        self.span.begin()
    }

    /// End of this occurrence (exclusive).
    #[must_use]
    pub const fn end(&self) -> &CalDateTime {
        self.span.end()
    }

    /// The occurrence's `[start, end)` interval.
    #[must_use]
    pub const fn timespan(&self) -> &Timespan {
        &self.span
    }

    /// The component this occurrence was expanded from.
    #[must_use]
    pub const fn master(&self) -> &'a C {
        self.master
    }

    /// UID, forwarded to the master.
    ///
    /// ## Errors
    ///
    /// Same as [`Schedulable::uid`].
    pub fn uid(&self) -> ModelResult<&str> {
        self.master.uid()
    }

    /// DTSTAMP, forwarded to the master.
    ///
    /// ## Errors
    ///
    /// Same as [`Schedulable::dtstamp`].
    pub fn dtstamp(&self) -> ModelResult<&CalDateTime> {
        self.master.dtstamp()
    }

    /// SUMMARY: the local shadow when set, the master's otherwise.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .or_else(|| self.master.core().summary())
    }

    /// COMMENT entries: the local shadow when set, the master's otherwise.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        self.comments
            .as_deref()
            .unwrap_or_else(|| self.master.core().comments())
    }

    /// Recurrence rule, forwarded to the master.
    #[must_use]
    pub fn rrule(&self) -> Option<&RecurrenceRule> {
        self.master.core().rrule()
    }

    /// RDATE additions, forwarded to the master.
    #[must_use]
    pub fn rdates(&self) -> &[CalDateTime] {
        self.master.core().rdates()
    }

    /// EXDATE exclusions, forwarded to the master.
    #[must_use]
    pub fn exdates(&self) -> &[CalDateTime] {
        self.master.core().exdates()
    }

    /// UID of the owning entity, resolved through the master.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.master.core().parent()
    }

    /// Shadows the SUMMARY for this occurrence only.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }

    /// Shadows the COMMENT list for this occurrence only.
    pub fn set_comments(&mut self, comments: Vec<String>) {
        self.comments = Some(comments);
    }
}

/// Value equality on (start, end, summary, comments); independent of
/// which master instance is borrowed.
impl<C: CalendarComponent> PartialEq for Occurrence<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.span == other.span
            && self.summary() == other.summary()
            && self.comments() == other.comments()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use crate::component::Event;

    use super::*;

    fn utc(day: u32, hour: u32) -> CalDateTime {
        CalDateTime::utc(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn master() -> Event {
        Event::builder()
            .uid("ev-1")
            .dtstamp(utc(1, 0))
            .dtstart(utc(1, 10))
            .dtend(utc(1, 11))
            .summary("standup")
            .comment("bring notes")
            .parent("cal-1")
            .build()
    }

    fn occurrence(event: &Event) -> Occurrence<'_, Event> {
        let span = Timespan::new(utc(2, 10), utc(2, 11)).unwrap();
        Occurrence::new(event, span)
    }

    #[test]
    fn reads_delegate_to_master() {
        let event = master();
        let occ = occurrence(&event);
        assert_eq!(occ.uid().unwrap(), "ev-1");
        assert_eq!(occ.summary(), Some("standup"));
        assert_eq!(occ.comments(), &["bring notes".to_owned()]);
        assert_eq!(occ.parent(), Some("cal-1"));
        assert_eq!(occ.timespan().duration(), TimeDelta::hours(1));
    }

    #[test]
    fn local_writes_never_reach_the_master() {
        let event = master();
        let mut occ = occurrence(&event);
        occ.set_summary("standup (moved)");
        occ.set_comments(vec!["remote only".to_owned()]);
        assert_eq!(occ.summary(), Some("standup (moved)"));
        assert_eq!(occ.comments(), &["remote only".to_owned()]);
        assert_eq!(event.core().summary(), Some("standup"));
        assert_eq!(event.core().comments(), &["bring notes".to_owned()]);
    }

    #[test]
    fn divergence_survives_across_occurrences() {
        let event = master();
        let mut shadowed = occurrence(&event);
        shadowed.set_summary("special");
        let pristine = occurrence(&event);
        assert_eq!(pristine.summary(), Some("standup"));
        assert_ne!(shadowed, pristine);
    }

    #[test]
    fn equality_is_by_value_not_identity() {
        let a = master();
        let b = master();
        assert_eq!(occurrence(&a), occurrence(&b));
    }
}
