//! Leaf value types for the koyomi calendar model.
//!
//! This crate holds the types shared by every layer of the model and kept
//! free of domain logic:
//!
//! - [`CalDateTime`]: a resolved calendar instant in one of the four
//!   RFC 5545 forms (date-only, floating, UTC, zoned)
//! - [`Timespan`]: a half-open `[begin, end)` interval of instants

pub mod datetime;
pub mod timespan;

pub use datetime::CalDateTime;
pub use timespan::Timespan;
