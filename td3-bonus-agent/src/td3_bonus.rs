//! TD3 agent with an additive bonus signal.
//!
//! The bonus is produced by a separately trained scoring network, for example
//! a discriminator, and can be injected into the critic target, the actor
//! objective or both, weighted by `beta`.
mod base;
mod bonus;
mod config;
pub use base::{smoothing_noise, ActorOutputs, CriticOutputs, TargetValues, Td3Bonus};
pub use bonus::{BonusConfig, BonusEvaluator};
pub use config::Td3BonusConfig;
