//! Calendar domain model: components, recurrence, and occurrence
//! expansion.
//!
//! Given already-parsed component values (this crate does no `iCalendar`
//! tokenizing), the model answers one question: which concrete
//! occurrences does an entity produce within a query range? Recurrence
//! rules are validated at construction and evaluated lazily; each
//! resulting occurrence is a lightweight flyweight that borrows its
//! master component instead of copying it.

pub mod component;
pub mod error;
pub mod expand;
pub mod recur;

pub use component::{
    CalendarComponent, ComponentKind, Event, EventBuilder, Journal, JournalBuilder, Schedulable,
    TimespanWithParent, ToDo, ToDoBuilder,
};
pub use error::{ModelError, ModelResult};
pub use expand::{Occurrence, Occurrences};
pub use recur::{
    Frequency, RecurrenceIter, RecurrenceRule, RecurrenceRuleBuilder, Weekday, WeekdayNum,
};

pub use koyomi_core::{CalDateTime, Timespan};
