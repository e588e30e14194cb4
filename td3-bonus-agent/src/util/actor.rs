//! Deterministic actor with a target network.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{track, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DeterministicActor`].
pub struct ActorConfig<P> {
    /// Configuration of the policy network.
    pub policy_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            policy_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for policy function.
    pub fn policy_config(mut self, v: P) -> Self {
        self.policy_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        if let Some(pi_config) = &mut self.policy_config {
            pi_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Loads [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Deterministic policy and its target copy.
///
/// The two networks are structurally identical but own separate [`VarMap`]s.
/// The target is a hard copy of the policy at construction and changes only
/// through [`DeterministicActor::soft_update`].
pub struct DeterministicActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
{
    varmap: VarMap,
    varmap_tgt: VarMap,
    policy: P,
    policy_tgt: P,
    opt: Optimizer,
}

impl<P> DeterministicActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: Clone,
{
    /// Constructs [`DeterministicActor`].
    pub fn build(config: ActorConfig<P::Config>, device: &Device) -> Result<Self> {
        let policy_config = config.policy_config.context("policy_config is not set.")?;
        let (varmap, policy) = Self::build_network(policy_config.clone(), device)?;
        let (varmap_tgt, policy_tgt) = Self::build_network(policy_config, device)?;
        track(&varmap_tgt, &varmap, 1.0)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            varmap_tgt,
            policy,
            policy_tgt,
            opt,
        })
    }

    fn build_network(config: P::Config, device: &Device) -> Result<(VarMap, P)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).set_prefix("actor");
        let policy = P::build(vb, config)?;
        Ok((varmap, policy))
    }

    /// Returns actions of the trained policy, `[batch_size, act_dim]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.policy.forward(obs)
    }

    /// Returns actions of the target policy, `[batch_size, act_dim]`.
    pub fn forward_tgt(&self, obs: &Tensor) -> Result<Tensor> {
        self.policy_tgt.forward(obs)
    }

    /// Applies a gradient step on the trained policy.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Moves the target policy towards the trained policy.
    pub fn soft_update(&mut self, tau: f64) -> Result<()> {
        track(&self.varmap_tgt, &self.varmap, tau)
    }

    /// Variables of the trained policy.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Variables of the target policy.
    pub fn varmap_tgt(&self) -> &VarMap {
        &self.varmap_tgt
    }

    /// Loads the trained and target policies from safetensors files.
    pub fn load(&mut self, path: impl AsRef<Path>, path_tgt: impl AsRef<Path>) -> Result<()> {
        self.varmap.load(path.as_ref())?;
        self.varmap_tgt.load(path_tgt.as_ref())?;
        info!(
            "Load actor parameters from {:?} and {:?}",
            path.as_ref(),
            path_tgt.as_ref()
        );
        Ok(())
    }
}
