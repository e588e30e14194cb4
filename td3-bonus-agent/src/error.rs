//! Errors of the agent crate.
use thiserror::Error;

/// Errors raised when building or running [`Td3Bonus`](crate::td3_bonus::Td3Bonus).
#[derive(Error, Debug, PartialEq)]
pub enum Td3BonusError {
    /// Only one of the mean and std of the observation normalization is given.
    #[error("observation normalization needs both mean and std (mean given: {has_mean}, std given: {has_std})")]
    IncompleteObsNormalization {
        /// Whether the mean is given.
        has_mean: bool,

        /// Whether the std is given.
        has_std: bool,
    },

    /// Mean and std of the observation normalization differ in length.
    #[error("obs mean has {mean} elements but obs std has {std}")]
    ObsNormalizationDim {
        /// Length of the mean.
        mean: usize,

        /// Length of the std.
        std: usize,
    },

    /// A non-positive element in the std of the observation normalization.
    #[error("obs std must be positive, got {value} at index {index}")]
    NonPositiveObsStd {
        /// Index of the element.
        index: usize,

        /// Value of the element.
        value: f32,
    },

    /// `policy_and_target_update_period` is zero.
    #[error("policy_and_target_update_period must be at least 1")]
    ZeroUpdatePeriod,

    /// Soft update coefficient out of `[0, 1]`.
    #[error("tau must lie in [0, 1], got {0}")]
    InvalidTau(f64),

    /// A negative noise parameter.
    #[error("{name} must be non-negative, got {value}")]
    NegativeNoise {
        /// Name of the parameter.
        name: &'static str,

        /// Given value.
        value: f64,
    },

    /// Batch size is zero.
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    /// A required configuration is not set.
    #[error("{0} is not set")]
    MissingConfig(&'static str),

    /// A variable of a target network has no counterpart in the source network.
    #[error("variable {0} is not found in the source network")]
    MissingVariable(String),

    /// Fields of a transition batch disagree in the batch dimension.
    #[error("{field} has {actual} samples, expected {expected}")]
    BatchSizeMismatch {
        /// Name of the field.
        field: &'static str,

        /// Batch size of the observations.
        expected: usize,

        /// Batch size of the field.
        actual: usize,
    },

    /// A transition batch without samples.
    #[error("transition batch is empty")]
    EmptyBatch,

    /// A terminal flag other than 0 or 1.
    #[error("terminal flags must be 0 or 1, got {0}")]
    InvalidTerminal(i8),
}
