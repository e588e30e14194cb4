//! Replay buffer interface.
use anyhow::Result;

/// Interface of replay buffers that generate batches for training.
///
/// The way transitions are stored and sampled is up to the implementation;
/// agents only ask for batches of a given size.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated for training.
    type Batch;

    /// Builds a replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of `size` transitions.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
