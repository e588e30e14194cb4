#![warn(missing_docs)]
//! Core components of TD3 with a bonus signal.
//!
//! This crate is independent of any tensor backend. It provides
//!
//! * [`Record`](record::Record), the container of diagnostics produced by
//!   training steps,
//! * [`TransitionBatch`] and [`ReplayBufferBase`], the interface to the data
//!   fed to agents,
//! * [`Agent`] and [`Configurable`], the interface of trainable agents.
pub mod error;
pub mod record;

mod base;
pub use base::{Agent, Configurable, ReplayBufferBase, TransitionBatch};
