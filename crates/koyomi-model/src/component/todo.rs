//! VTODO (RFC 5545 §3.6.2).

use chrono::TimeDelta;

use koyomi_core::CalDateTime;

use crate::recur::RecurrenceRule;

use super::{component_eq, CalendarComponent, ComponentCore, ComponentKind};

/// A to-do: work expected to be completed by a due instant.
///
/// The end is the DUE property when present, otherwise DTSTART plus the
/// declared DURATION. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ToDo {
    core: ComponentCore,
    due: Option<CalDateTime>,
    duration: Option<TimeDelta>,
}

impl ToDo {
    /// Starts a to-do builder.
    #[must_use]
    pub fn builder() -> ToDoBuilder {
        ToDoBuilder::default()
    }

    /// DUE, if set.
    #[must_use]
    pub const fn due(&self) -> Option<&CalDateTime> {
        self.due.as_ref()
    }
}

impl CalendarComponent for ToDo {
    fn kind(&self) -> ComponentKind {
        ComponentKind::ToDo
    }

    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn ending(&self) -> Option<&CalDateTime> {
        self.due.as_ref()
    }

    fn declared_duration(&self) -> Option<TimeDelta> {
        self.duration
    }
}

impl PartialEq for ToDo {
    fn eq(&self, other: &Self) -> bool {
        component_eq(self, other)
    }
}

/// Builder for [`ToDo`].
#[derive(Debug, Clone, Default)]
pub struct ToDoBuilder {
    core: ComponentCore,
    due: Option<CalDateTime>,
    duration: Option<TimeDelta>,
}

impl ToDoBuilder {
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

    /// Sets the DUE instant.
    #[must_use]
    pub fn due(mut self, due: CalDateTime) -> Self {
        self.due = Some(due);
        self
    }

    /// Sets the declared DURATION.
    #[must_use]
    pub fn duration(mut self, duration: TimeDelta) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Builds the to-do.
    #[must_use]
    pub fn build(self) -> ToDo {
        ToDo {
            core: self.core.finish(),
            due: self.due,
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
    fn due_is_the_ending() {
        let todo = ToDo::builder().dtstart(utc(1, 9)).due(utc(2, 17)).build();
        assert_eq!(todo.end(), Some(&utc(2, 17)));
        assert_eq!(
            todo.computed_duration(),
            Some(TimeDelta::hours(24 + 8))
        );
    }

    #[test]
    fn duration_fallback_without_due() {
        let todo = ToDo::builder()
            .dtstart(utc(1, 9))
            .duration(TimeDelta::hours(4))
            .build();
        assert_eq!(todo.end(), Some(&utc(1, 13)));
    }

    #[test]
    fn unresolvable_without_start() {
        let todo = ToDo::builder().due(utc(2, 17)).build();
        assert_eq!(todo.start(), None);
        assert_eq!(todo.computed_duration(), None);
        assert!(todo.timespan().is_err());
    }
}
