//! TD3 agent with an additive bonus signal, implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! The agent, [`Td3Bonus`](td3_bonus::Td3Bonus), trains a deterministic policy
//! and twin critics. An externally trained scoring model, the bonus network,
//! can be injected into the critic target and/or the actor objective.
pub mod error;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod td3_bonus;
mod tensor_batch;
pub mod util;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
pub use tensor_batch::TensorTransitionBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
