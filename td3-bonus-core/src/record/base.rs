//! Base implementation of records.
use super::Summary;
use crate::error::CoreError;
use std::{collections::HashMap, convert::Into};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, e.g., the loss of a critic.
    Scalar(f32),

    /// Summary statistics of the values in a batch.
    Summary(Summary),
}

/// A map from metric names to [`RecordValue`]s.
///
/// # Examples
///
/// ```rust
/// use td3_bonus_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("policy_loss", -1.5);
/// record.insert("qf1_loss", RecordValue::Scalar(0.3));
///
/// assert_eq!(record.len(), 2);
/// assert!(record.get_summary("qf1_loss").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record, overwriting an existing value.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Inserts summary statistics of `values` with key `k`.
    pub fn insert_summary(&mut self, k: impl Into<String>, values: &[f32]) -> Result<(), CoreError> {
        let k = k.into();
        let summary = Summary::from_slice(&k, values)?;
        self.0.insert(k, RecordValue::Summary(summary));
        Ok(())
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns `true` if the record has a value for the key.
    pub fn contains_key(&self, k: &str) -> bool {
        self.0.contains_key(k)
    }

    /// Merges two records, consuming both.
    ///
    /// Values in `record` overwrite those in `self` with the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, CoreError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(CoreError::RecordValueTypeError {
                key: k.to_string(),
                expected: "Scalar",
            }),
            None => Err(CoreError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets summary statistics from the record.
    pub fn get_summary(&self, k: &str) -> Result<Summary, CoreError> {
        match self.0.get(k) {
            Some(RecordValue::Summary(s)) => Ok(*s),
            Some(_) => Err(CoreError::RecordValueTypeError {
                key: k.to_string(),
                expected: "Summary",
            }),
            None => Err(CoreError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns the number of values in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
