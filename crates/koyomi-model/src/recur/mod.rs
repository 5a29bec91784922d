//! Recurrence rules (RFC 5545 §3.3.10, §3.8.5.3) and their evaluation.
//!
//! - `rule`: the validated, immutable [`RecurrenceRule`] and its vocabulary
//! - `evaluate`: period-based expansion of a rule into an ascending
//!   instant sequence

pub mod evaluate;
pub mod rule;

pub use evaluate::RecurrenceIter;
pub use rule::{Frequency, RecurrenceRule, RecurrenceRuleBuilder, Weekday, WeekdayNum};
