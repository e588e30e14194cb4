//! Core functionalities.
mod agent;
mod batch;
mod configurable;
mod replay_buffer;
pub use agent::Agent;
pub use batch::TransitionBatch;
pub use configurable::Configurable;
pub use replay_buffer::ReplayBufferBase;
