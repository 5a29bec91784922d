//! Calendar components (RFC 5545 §3.6).
//!
//! The three schedulable kinds share a [`ComponentCore`] property set by
//! composition and expose kind-specific behavior through the
//! [`CalendarComponent`] trait, resolved statically. Derived scheduling
//! behavior (start/end/duration resolution, timespans, occurrence
//! expansion) lives in the [`Schedulable`] extension trait, blanket
//! implemented for every component kind.

use std::fmt;
use std::sync::OnceLock;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use koyomi_core::{CalDateTime, Timespan};

use crate::error::{ModelError, ModelResult};
use crate::expand::Occurrences;
use crate::recur::RecurrenceRule;

pub mod event;
pub mod journal;
pub mod todo;

pub use event::{Event, EventBuilder};
pub use journal::{Journal, JournalBuilder};
pub use todo::{ToDo, ToDoBuilder};

/// The closed set of schedulable component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Event,
    ToDo,
    Journal,
}

impl ComponentKind {
    /// Returns the `iCalendar` component name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::ToDo => "VTODO",
            Self::Journal => "VJOURNAL",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The derived (start, end, duration) triple, memoized per component.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedTimes {
    pub(crate) start: Option<CalDateTime>,
    pub(crate) end: Option<CalDateTime>,
    pub(crate) duration: Option<TimeDelta>,
}

/// Property set shared by every component kind.
///
/// UID and DTSTAMP are required by RFC 5545 but checked on access rather
/// than construction, so a partially-specified component can still be
/// built and inspected; reading a missing required property fails with
/// [`ModelError::MissingRequiredProperty`].
///
/// Components are immutable once built, which makes the memoized time
/// resolution a pure function of fixed inputs.
#[derive(Debug, Clone, Default)]
pub struct ComponentCore {
    pub(crate) uid: Option<String>,
    pub(crate) dtstamp: Option<CalDateTime>,
    pub(crate) dtstart: Option<CalDateTime>,
    pub(crate) summary: Option<String>,
    pub(crate) comments: Vec<String>,
    pub(crate) rrule: Option<RecurrenceRule>,
    /// Explicit additional recurrence instants, kept sorted.
    pub(crate) rdates: Vec<CalDateTime>,
    /// Excluded recurrence instants, kept sorted for binary search.
    pub(crate) exdates: Vec<CalDateTime>,
    /// UID of the owning entity in the component tree, if any.
    pub(crate) parent: Option<String>,
    pub(crate) times: OnceLock<ResolvedTimes>,
}

impl ComponentCore {
    /// DTSTART, if set.
    #[must_use]
    pub const fn dtstart(&self) -> Option<&CalDateTime> {
        self.dtstart.as_ref()
    }

    /// SUMMARY, if set.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// COMMENT entries.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// The recurrence rule, if set.
    #[must_use]
    pub const fn rrule(&self) -> Option<&RecurrenceRule> {
        self.rrule.as_ref()
    }

    /// RDATE additions, ascending.
    #[must_use]
    pub fn rdates(&self) -> &[CalDateTime] {
        &self.rdates
    }

    /// EXDATE exclusions, ascending.
    #[must_use]
    pub fn exdates(&self) -> &[CalDateTime] {
        &self.exdates
    }

    /// UID of the owning entity, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Normalizes list properties after construction.
    pub(crate) fn finish(mut self) -> Self {
        self.rdates.sort();
        self.rdates.dedup();
        self.exdates.sort();
        self.exdates.dedup();
        self
    }
}

/// Kind-specific surface of a calendar component.
pub trait CalendarComponent {
    /// The concrete component kind.
    fn kind(&self) -> ComponentKind;

    /// The shared property set.
    fn core(&self) -> &ComponentCore;

    /// The kind's explicit ending property (DTEND / DUE / DTSTART).
    fn ending(&self) -> Option<&CalDateTime>;

    /// The kind's declared duration, if it has one.
    fn declared_duration(&self) -> Option<TimeDelta>;
}

/// Derived scheduling behavior, shared across kinds.
///
/// Blanket implemented for every [`CalendarComponent`]; all methods
/// resolve statically.
pub trait Schedulable: CalendarComponent {
    /// UID of the component.
    ///
    /// ## Errors
    ///
    /// [`ModelError::MissingRequiredProperty`] when unset.
    fn uid(&self) -> ModelResult<&str> {
        self.core()
            .uid
            .as_deref()
            .ok_or(ModelError::MissingRequiredProperty {
                kind: self.kind(),
                property: "UID",
            })
    }

    /// DTSTAMP of the component.
    ///
    /// ## Errors
    ///
    /// [`ModelError::MissingRequiredProperty`] when unset.
    fn dtstamp(&self) -> ModelResult<&CalDateTime> {
        self.core()
            .dtstamp
            .as_ref()
            .ok_or(ModelError::MissingRequiredProperty {
                kind: self.kind(),
                property: "DTSTAMP",
            })
    }

    /// Resolved start instant: DTSTART, if set.
    fn start(&self) -> Option<&CalDateTime> {
        resolved(self).start.as_ref()
    }

    /// Resolved end instant.
    ///
    /// The explicit ending when set, otherwise start plus the declared
    /// duration when both are known.
    fn end(&self) -> Option<&CalDateTime> {
        resolved(self).end.as_ref()
    }

    /// Resolved duration.
    ///
    /// The declared duration when set, otherwise end minus start when
    /// both are known. `end == start + computed_duration` holds whenever
    /// all three resolve.
    fn computed_duration(&self) -> Option<TimeDelta> {
        resolved(self).duration
    }

    /// The component's own `[start, end)` interval.
    ///
    /// ## Errors
    ///
    /// [`ModelError::UnresolvedTimespan`] when start or end cannot be
    /// derived, or the pair is inverted.
    fn timespan(&self) -> ModelResult<Timespan> {
        let times = resolved(self);
        let unresolved = || ModelError::UnresolvedTimespan { kind: self.kind() };
        let begin = times.start.clone().ok_or_else(unresolved)?;
        let end = times.end.clone().ok_or_else(unresolved)?;
        Timespan::new(begin, end).ok_or_else(unresolved)
    }

    /// The component's interval together with a back-reference to it.
    ///
    /// ## Errors
    ///
    /// Same as [`Schedulable::timespan`].
    fn timespan_with_parent(&self) -> ModelResult<TimespanWithParent<'_, Self>>
    where
        Self: Sized,
    {
        Ok(TimespanWithParent {
            span: self.timespan()?,
            parent: self,
        })
    }

    /// Expands the component's occurrences intersecting `range`.
    ///
    /// The component's own pair is always the first item; recurrence and
    /// RDATE instants follow in strictly ascending order, EXDATEs removed,
    /// clipped to `range`. See [`Occurrences`].
    ///
    /// ## Errors
    ///
    /// [`ModelError::UnresolvedTimespan`] when the component has no
    /// resolvable start/end pair, [`ModelError::UnboundedRecurrence`] is
    /// impossible here (the range end bounds the rule).
    fn occurrences<'a>(&'a self, range: &Timespan) -> ModelResult<Occurrences<'a, Self>>
    where
        Self: Sized,
    {
        Occurrences::new(self, range)
    }
}

impl<C: CalendarComponent> Schedulable for C {}

/// Memoized derivation of the (start, end, duration) triple.
///
/// Computed once per component from immutable inputs; concurrent first
/// reads race harmlessly toward the same value.
pub(crate) fn resolved<C: CalendarComponent + ?Sized>(component: &C) -> &ResolvedTimes {
    component.core().times.get_or_init(|| {
        let start = component.core().dtstart.clone();
        let declared = component.declared_duration();
        let end = component.ending().cloned().or_else(|| match (&start, declared) {
            (Some(s), Some(d)) => s.checked_add(d),
            _ => None,
        });
        let duration = declared.or_else(|| match (&start, &end) {
            (Some(s), Some(e)) => Some(e.signed_duration_since(s)),
            _ => None,
        });
        ResolvedTimes {
            start,
            end,
            duration,
        }
    })
}

/// A component's interval paired with a borrow of the component itself.
#[derive(Debug, Clone)]
pub struct TimespanWithParent<'a, C> {
    span: Timespan,
    parent: &'a C,
}

impl<'a, C> TimespanWithParent<'a, C> {
    /// The interval.
    #[must_use]
    pub const fn span(&self) -> &Timespan {
        &self.span
    }

    /// The component the interval belongs to.
    #[must_use]
    pub const fn parent(&self) -> &'a C {
        self.parent
    }
}

/// Shared equality for components: same kind and equal
/// (DTSTART, ending, SUMMARY, COMMENT).
pub(crate) fn component_eq<A, B>(a: &A, b: &B) -> bool
where
    A: CalendarComponent,
    B: CalendarComponent,
{
    a.kind() == b.kind()
        && a.core().dtstart == b.core().dtstart
        && a.ending() == b.ending()
        && a.core().summary == b.core().summary
        && a.core().comments == b.core().comments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(ComponentKind::Event.as_str(), "VEVENT");
        assert_eq!(ComponentKind::ToDo.to_string(), "VTODO");
        assert_eq!(ComponentKind::Journal.as_str(), "VJOURNAL");
    }

    #[test]
    fn missing_required_properties_fail_on_access() {
        let event = Event::builder().build();
        assert!(matches!(
            event.uid(),
            Err(ModelError::MissingRequiredProperty { property: "UID", .. })
        ));
        assert!(matches!(
            event.dtstamp(),
            Err(ModelError::MissingRequiredProperty {
                property: "DTSTAMP",
                ..
            })
        ));
    }

    #[test]
    fn timespan_requires_resolvable_bounds() {
        let event = Event::builder()
            .dtstart(CalDateTime::utc(2024, 1, 1, 10, 0, 0).unwrap())
            .build();
        assert!(matches!(
            event.timespan(),
            Err(ModelError::UnresolvedTimespan {
                kind: ComponentKind::Event
            })
        ));
    }

    #[test]
    fn timespan_with_parent_borrows_the_component() {
        let event = Event::builder()
            .dtstart(CalDateTime::utc(2024, 1, 1, 10, 0, 0).unwrap())
            .dtend(CalDateTime::utc(2024, 1, 1, 11, 0, 0).unwrap())
            .build();
        let tsp = event.timespan_with_parent().unwrap();
        assert_eq!(tsp.span().duration(), TimeDelta::hours(1));
        assert!(std::ptr::eq(tsp.parent(), &event));
    }
}
