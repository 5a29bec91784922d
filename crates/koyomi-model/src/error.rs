//! Error taxonomy for the calendar model.
//!
//! Every variant is fail-fast: violations surface at the point of access
//! or construction and are never silently defaulted. Expansion over
//! malformed input fails before yielding any occurrence.

use thiserror::Error;

use crate::component::ComponentKind;

/// Model error with minimal dependencies.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required property (UID, DTSTAMP) was read but never set.
    #[error("{kind} is missing required property {property}")]
    MissingRequiredProperty {
        /// Kind of the component the read was issued against.
        kind: ComponentKind,
        /// `iCalendar` name of the missing property.
        property: &'static str,
    },

    /// A timespan or duration was requested but start or end cannot be derived.
    #[error("{kind} has no resolvable start/end to build a timespan from")]
    UnresolvedTimespan {
        /// Kind of the component the request was issued against.
        kind: ComponentKind,
    },

    /// Rule construction failed: COUNT and UNTIL both set, an out-of-range
    /// by-field value, or a non-positive interval/count.
    #[error("invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    /// A rule with neither COUNT nor UNTIL was evaluated without a horizon.
    #[error("recurrence rule has neither COUNT nor UNTIL and requires an evaluation horizon")]
    UnboundedRecurrence,
}

/// Result alias used throughout the model.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
