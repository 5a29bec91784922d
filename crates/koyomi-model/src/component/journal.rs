//! VJOURNAL (RFC 5545 §3.6.3).

use chrono::TimeDelta;

use koyomi_core::CalDateTime;

use crate::recur::RecurrenceRule;

use super::{component_eq, CalendarComponent, ComponentCore, ComponentKind};

/// A journal entry: a note attached to an instant, without extent.
///
/// A journal ends where it starts and always has zero duration.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    core: ComponentCore,
}

impl Journal {
    /// Starts a journal builder.
    #[must_use]
    pub fn builder() -> JournalBuilder {
        JournalBuilder::default()
    }
}

impl CalendarComponent for Journal {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Journal
    }

    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn ending(&self) -> Option<&CalDateTime> {
        self.core.dtstart.as_ref()
    }

    fn declared_duration(&self) -> Option<TimeDelta> {
        Some(TimeDelta::zero())
    }
}

impl PartialEq for Journal {
    fn eq(&self, other: &Self) -> bool {
        component_eq(self, other)
    }
}

/// Builder for [`Journal`].
#[derive(Debug, Clone, Default)]
pub struct JournalBuilder {
    core: ComponentCore,
}

impl JournalBuilder {
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

    /// Builds the journal.
    #[must_use]
    pub fn build(self) -> Journal {
        Journal {
            core: self.core.finish(),
        }
    }
}
