//! Error types for parsing and validating relay records.

/// A timestamp string could not be interpreted as an instant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The input was empty or whitespace only.
    #[error("timestamp is empty")]
    Empty,

    /// The input did not match any accepted ISO-8601 form.
    #[error("unparsable timestamp {input:?}")]
    Unparsable {
        /// The rejected input.
        input: String,
    },
}

/// A location record failed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The driver identifier was empty.
    #[error("driver_id must not be empty")]
    EmptyDriverId,

    /// A coordinate was NaN or infinite.
    #[error("{field} must be a finite number")]
    NonFiniteCoordinate {
        /// Which coordinate failed (`latitude` or `longitude`).
        field: &'static str,
    },
}
