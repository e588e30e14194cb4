//! Errors in the core crate.
use thiserror::Error;

/// Errors in the core crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: expected {expected} for key {key}")]
    RecordValueTypeError {
        /// Key of the value.
        key: String,

        /// Name of the expected variant.
        expected: &'static str,
    },

    /// Summary statistics of an empty slice.
    #[error("Cannot summarize an empty set of values for {0}")]
    EmptySummary(String),
}
