//! Multilayer perceptron.
mod base;
mod config;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;
use serde::{Deserialize, Serialize};

/// Activation function applied to the output layer of [`Mlp`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy, Default)]
pub enum Activation {
    /// Identity.
    #[default]
    None,

    /// ReLU.
    ReLU,

    /// Hyperbolic tangent, typically used for bounded actions.
    Tanh,

    /// Logistic sigmoid, typically used for discriminators.
    Sigmoid,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(match self {
            Self::None => xs.clone(),
            Self::ReLU => xs.relu()?,
            Self::Tanh => xs.tanh()?,
            Self::Sigmoid => candle_nn::ops::sigmoid(xs)?,
        })
    }
}

// Hidden layers use ReLU.
fn mlp_forward(xs: Tensor, layers: &[Linear], final_act: &Activation) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for layer in layers.iter().take(n_layers - 1) {
        xs = layer.forward(&xs)?.relu()?;
    }

    let xs = layers[n_layers - 1].forward(&xs)?;
    final_act.forward(&xs)
}
