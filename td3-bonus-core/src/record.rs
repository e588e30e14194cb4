//! Types for recording diagnostics of training steps.
//!
//! [`Record`] is a map from metric names to [`RecordValue`]s. A value is either
//! a scalar, e.g., a loss, or a [`Summary`] of a batch of values, e.g., the
//! predictions of a critic over the samples in a batch.
//!
//! ```rust
//! use td3_bonus_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("qf1_loss", RecordValue::Scalar(0.25));
//! record.insert_summary("q1_predictions", &[1.0, 2.0, 3.0]).unwrap();
//!
//! assert_eq!(record.get_scalar("qf1_loss").unwrap(), 0.25);
//! assert_eq!(record.get_summary("q1_predictions").unwrap().mean, 2.0);
//! ```
mod base;
mod summary;

pub use base::{Record, RecordValue};
pub use summary::Summary;
