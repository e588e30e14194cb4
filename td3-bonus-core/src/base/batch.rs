//! Batch of transitions.

/// A batch of transitions `(o_t, a_t, o_t+1, r_t, is_terminated_t)`.
///
/// All fields share the leading batch dimension. `is_terminated_t` is 1 when
/// `o_t+1` is a terminal state, in which case no value is bootstrapped from it.
pub trait TransitionBatch {
    /// A set of observations in a batch.
    type ObsBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, is_terminated_t)`.
    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
    );

    /// Returns the number of transitions in the batch.
    fn len(&self) -> usize;

    /// Returns `true` if the batch has no transitions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
