//! Utilities.
use crate::error::Td3BonusError;
use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor};
use candle_nn::VarMap;
use log::trace;
use serde::{Deserialize, Serialize};
mod actor;
mod critic;
pub use actor::{ActorConfig, DeterministicActor};
pub use critic::{Critic, CriticConfig};

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    #[default]
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl CriticLoss {
    /// Returns the loss between predictions and targets, averaged over the batch.
    pub fn loss(&self, pred: &Tensor, tgt: &Tensor) -> Result<Tensor> {
        match self {
            Self::Mse => Ok(candle_nn::loss::mse(pred, tgt)?),
            Self::SmoothL1 => Ok(smooth_l1_loss(pred, tgt)?),
        }
    }
}

/// Apply soft update on variables.
///
/// Variables are identified by their names. Every variable of `dest` must
/// have a counterpart in `src`.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("dest");
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the target variables is poisoned"))?;
    trace!("src");
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the source variables is poisoned"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| Td3BonusError::MissingVariable(k_dest.clone()))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = m1.affine(-1.0, 1.0)?;
    let quadratic = ((0.5 * m1)? * d.sqr()?)?;
    let linear = (m2 * (d - 0.5)?)?;
    (quadratic + linear)?.mean_all()
}
