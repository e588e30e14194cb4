//! Agent.
use super::ReplayBufferBase;
use crate::record::Record;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Represents a trainable agent fed by a replay buffer.
pub trait Agent<R: ReplayBufferBase> {
    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters.
    fn opt(&mut self, buffer: &mut R) -> Result<()> {
        self.opt_with_record(buffer).map(|_| ())
    }

    /// Performs an optimization step and returns the latest diagnostics.
    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record>;

    /// Notifies the agent that an epoch has ended.
    ///
    /// Agents refresh their diagnostics on the next optimization step.
    fn end_epoch(&mut self, epoch: usize);

    /// Saves the parameters of the agent in the given directory.
    ///
    /// Returns the paths of the created files.
    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Loads the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
