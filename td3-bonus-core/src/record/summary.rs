//! Summary statistics of a set of values.
use crate::error::CoreError;

/// Mean, standard deviation, minimum and maximum of a set of values.
///
/// The standard deviation is the population one (no Bessel correction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Mean.
    pub mean: f32,

    /// Standard deviation.
    pub std: f32,

    /// Minimum.
    pub min: f32,

    /// Maximum.
    pub max: f32,
}

impl Summary {
    /// Computes the summary of the given values.
    ///
    /// `name` is only used in the error message when `vs` is empty.
    pub fn from_slice(name: &str, vs: &[f32]) -> Result<Self, CoreError> {
        if vs.is_empty() {
            return Err(CoreError::EmptySummary(name.to_string()));
        }

        let n = vs.len() as f64;
        let mean = vs.iter().map(|v| *v as f64).sum::<f64>() / n;
        let var = vs
            .iter()
            .map(|v| (*v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let min = *vs.iter().min_by(|x, y| x.total_cmp(y)).unwrap_or(&f32::NAN);
        let max = *vs.iter().max_by(|x, y| x.total_cmp(y)).unwrap_or(&f32::NAN);

        Ok(Self {
            mean: mean as f32,
            std: var.sqrt() as f32,
            min,
            max,
        })
    }
}
