//! Critic with a target network.
use crate::{
    model::SubModel2,
    opt::{Optimizer, OptimizerConfig},
    util::track,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`].
pub struct CriticConfig<Q> {
    /// Configuration of the action-value network.
    pub q_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> CriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`CriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value function for continuous actions, with its own target network
/// and optimizer.
///
/// The network takes observations and actions and outputs `[batch_size, 1]`;
/// [`Critic::forward`] and [`Critic::forward_tgt`] return `[batch_size]`.
pub struct Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
{
    varmap: VarMap,
    varmap_tgt: VarMap, // for target network
    q: Q,
    q_tgt: Q,
    opt: Optimizer, // no optimizer required for target network
}

impl<Q> Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig<Q::Config>, device: &Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let (varmap, q) = Self::build_network(q_config.clone(), device)?;
        let (varmap_tgt, q_tgt) = Self::build_network(q_config, device)?;
        track(&varmap_tgt, &varmap, 1.0)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            varmap_tgt,
            q,
            q_tgt,
            opt,
        })
    }

    fn build_network(config: Q::Config, device: &Device) -> Result<(VarMap, Q)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).set_prefix("critic");
        let q = Q::build(vb, config)?;
        Ok((varmap, q))
    }

    /// Returns action values of the trained network.
    pub fn forward(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok(self.q.forward(obs, act)?.squeeze(D::Minus1)?)
    }

    /// Returns action values of the target network.
    pub fn forward_tgt(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok(self.q_tgt.forward(obs, act)?.squeeze(D::Minus1)?)
    }

    /// Applies a gradient step on the trained network.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Moves the target network towards the trained network.
    pub fn soft_update(&mut self, tau: f64) -> Result<()> {
        track(&self.varmap_tgt, &self.varmap, tau)
    }

    /// Variables of the trained network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Variables of the target network.
    pub fn varmap_tgt(&self) -> &VarMap {
        &self.varmap_tgt
    }

    /// Loads the trained and target networks from safetensors files.
    pub fn load(&mut self, path: impl AsRef<Path>, path_tgt: impl AsRef<Path>) -> Result<()> {
        self.varmap.load(path.as_ref())?;
        self.varmap_tgt.load(path_tgt.as_ref())?;
        info!(
            "Load critic parameters from {:?} and {:?}",
            path.as_ref(),
            path_tgt.as_ref()
        );
        Ok(())
    }
}
