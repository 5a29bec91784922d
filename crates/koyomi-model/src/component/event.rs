//! VEVENT (RFC 5545 §3.6.1).

use chrono::TimeDelta;

use koyomi_core::CalDateTime;

use crate::recur::RecurrenceRule;

use super::{component_eq, CalendarComponent, ComponentCore, ComponentKind};

/// An event: a block of time with a start and an end.
///
/// The end is the explicit DTEND when present, otherwise DTSTART plus the
/// declared DURATION. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Event {
    core: ComponentCore,
    dtend: Option<CalDateTime>,
    duration: Option<TimeDelta>,
}

impl Event {
    /// Starts an event builder.
    #[must_use]
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    /// DTEND, if set.
    #[must_use]
    pub const fn dtend(&self) -> Option<&CalDateTime> {
        self.dtend.as_ref()
    }
}

impl CalendarComponent for Event {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Event
    }

    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn ending(&self) -> Option<&CalDateTime> {
        self.dtend.as_ref()
    }

    fn declared_duration(&self) -> Option<TimeDelta> {
        self.duration
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        component_eq(self, other)
    }
}

/// Builder for [`Event`].
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    core: ComponentCore,
    dtend: Option<CalDateTime>,
    duration: Option<TimeDelta>,
}

impl EventBuilder {
    /// Sets the UID.
    #[must_use]
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.core.uid = Some(uid.into());
        self
    }

    /// Sets the DTSTAMP.
    #[must_use]
    pub fn dtstamp(mut self, dtstamp: CalDateTime) -> Self {
        self.core.dtstamp = Some(dtstamp);
        self
    }

    /// Sets the DTSTART.
    #[must_use]
    pub fn dtstart(mut self, dtstart: CalDateTime) -> Self {
        self.core.dtstart = Some(dtstart);
        self
    }

    /// Sets the SUMMARY.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.core.summary = Some(summary.into());
        self
    }

    /// Adds a COMMENT.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.core.comments.push(comment.into());
        self
    }

    /// Sets the recurrence rule.
    #[must_use]
    pub fn rrule(mut self, rrule: RecurrenceRule) -> Self {
        self.core.rrule = Some(rrule);
        self
    }

    /// Adds an RDATE instant.
    #[must_use]
    pub fn rdate(mut self, rdate: CalDateTime) -> Self {
        self.core.rdates.push(rdate);
        self
    }

    /// Adds an EXDATE instant.
    #[must_use]
    pub fn exdate(mut self, exdate: CalDateTime) -> Self {
        self.core.exdates.push(exdate);
        self
    }

    /// Sets the owning entity's UID.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.core.parent = Some(parent.into());
        self
    }

    /// Sets the DTEND.
    #[must_use]
    pub fn dtend(mut self, dtend: CalDateTime) -> Self {
        self.dtend = Some(dtend);
        self
    }

    /// Sets the declared DURATION.
    #[must_use]
    pub fn duration(mut self, duration: TimeDelta) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            core: self.core.finish(),
            dtend: self.dtend,
            duration: self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::component::Schedulable;

    use super::*;

    fn utc(day: u32, hour: u32) -> CalDateTime {
        CalDateTime::utc(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn end_prefers_explicit_dtend() {
        let event = Event::builder()
            .dtstart(utc(1, 10))
            .dtend(utc(1, 12))
            .duration(TimeDelta::minutes(5))
            .build();
        assert_eq!(event.end(), Some(&utc(1, 12)));
        // The declared duration still wins for the computed duration.
        assert_eq!(event.computed_duration(), Some(TimeDelta::minutes(5)));
    }

    #[test]
    fn end_falls_back_to_start_plus_duration() {
        let event = Event::builder()
            .dtstart(utc(1, 10))
            .duration(TimeDelta::hours(2))
            .build();
        assert_eq!(event.end(), Some(&utc(1, 12)));
        assert_eq!(event.computed_duration(), Some(TimeDelta::hours(2)));
    }

    #[test]
    fn duration_derived_from_bounds() {
        let event = Event::builder()
            .dtstart(utc(1, 10))
            .dtend(utc(1, 11))
            .build();
        assert_eq!(event.computed_duration(), Some(TimeDelta::hours(1)));
    }

    #[test]
    fn equality_ignores_uid() {
        let a = Event::builder().uid("a").dtstart(utc(1, 10)).summary("call").build();
        let b = Event::builder().uid("b").dtstart(utc(1, 10)).summary("call").build();
        assert_eq!(a, b);
        let c = Event::builder().uid("a").dtstart(utc(1, 10)).summary("other").build();
        assert_ne!(a, c);
    }

    #[test]
    fn builder_sorts_recurrence_lists() {
        let event = Event::builder()
            .rdate(utc(3, 0))
            .rdate(utc(1, 0))
            .rdate(utc(3, 0))
            .build();
        assert_eq!(event.core().rdates(), &[utc(1, 0), utc(3, 0)]);
    }
}
