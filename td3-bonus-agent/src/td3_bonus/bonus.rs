//! Bonus evaluator.
use crate::{error::Td3BonusError, model::SubModel1};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration of the bonus signal.
///
/// The bonus network maps the concatenation of a (normalized) observation
/// and an action to a scalar score. It is trained elsewhere and only
/// evaluated here.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BonusConfig<B> {
    /// Configuration of the bonus network.
    pub model_config: Option<B>,

    /// Safetensors file with the weights of the bonus network.
    ///
    /// When not given, the network keeps its initial weights.
    pub model_path: Option<PathBuf>,

    /// Mixing coefficient of the bonus.
    pub beta: f64,

    /// Adds the bonus to the pessimistic value in the critic target.
    pub use_bonus_critic: bool,

    /// Adds the bonus to the action value in the actor objective.
    pub use_bonus_policy: bool,

    /// Takes the natural logarithm of the raw output of the bonus network.
    pub use_log: bool,

    /// Mean of the observations, for standardization before the bonus network.
    pub obs_mean: Option<Vec<f32>>,

    /// Standard deviation of the observations, for standardization before the bonus network.
    pub obs_std: Option<Vec<f32>>,
}

impl<B> Default for BonusConfig<B> {
    fn default() -> Self {
        Self {
            model_config: None,
            model_path: None,
            beta: 0.1,
            use_bonus_critic: false,
            use_bonus_policy: false,
            use_log: false,
            obs_mean: None,
            obs_std: None,
        }
    }
}

impl<B> BonusConfig<B> {
    /// Sets the configuration of the bonus network.
    pub fn model_config(mut self, v: B) -> Self {
        self.model_config = Some(v);
        self
    }

    /// Sets the path of the weights of the bonus network.
    pub fn model_path(mut self, v: impl Into<PathBuf>) -> Self {
        self.model_path = Some(v.into());
        self
    }

    /// Sets the mixing coefficient.
    pub fn beta(mut self, v: f64) -> Self {
        self.beta = v;
        self
    }

    /// Enables or disables the bonus in the critic target.
    pub fn use_bonus_critic(mut self, v: bool) -> Self {
        self.use_bonus_critic = v;
        self
    }

    /// Enables or disables the bonus in the actor objective.
    pub fn use_bonus_policy(mut self, v: bool) -> Self {
        self.use_bonus_policy = v;
        self
    }

    /// Enables or disables the logarithm of the bonus.
    pub fn use_log(mut self, v: bool) -> Self {
        self.use_log = v;
        self
    }

    /// Sets the observation normalization.
    pub fn obs_normalization(mut self, mean: Vec<f32>, std: Vec<f32>) -> Self {
        self.obs_mean = Some(mean);
        self.obs_std = Some(std);
        self
    }

    /// Returns `true` if the bonus is used in the critic target or the actor objective.
    pub fn is_active(&self) -> bool {
        self.use_bonus_critic || self.use_bonus_policy
    }

    /// Checks the observation normalization.
    pub fn validate(&self) -> Result<(), Td3BonusError> {
        match (&self.obs_mean, &self.obs_std) {
            (None, None) => Ok(()),
            (Some(mean), Some(std)) => {
                if mean.len() != std.len() {
                    return Err(Td3BonusError::ObsNormalizationDim {
                        mean: mean.len(),
                        std: std.len(),
                    });
                }
                match std.iter().position(|&s| s <= 0.0 || s.is_nan()) {
                    Some(index) => Err(Td3BonusError::NonPositiveObsStd {
                        index,
                        value: std[index],
                    }),
                    None => Ok(()),
                }
            }
            (mean, std) => Err(Td3BonusError::IncompleteObsNormalization {
                has_mean: mean.is_some(),
                has_std: std.is_some(),
            }),
        }
    }
}

/// Evaluates the bonus of observation-action pairs.
///
/// The variables of the bonus network are never handed to an optimizer.
/// Whether gradients flow through the bonus is decided by the caller.
pub struct BonusEvaluator<B>
where
    B: SubModel1<Input = Tensor, Output = Tensor>,
{
    varmap: VarMap,
    model: B,

    // (mean, std), both [1, obs_dim]
    obs_normalization: Option<(Tensor, Tensor)>,

    use_log: bool,
}

impl<B> BonusEvaluator<B>
where
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: Clone,
{
    /// Constructs [`BonusEvaluator`].
    pub fn build(config: &BonusConfig<B::Config>, device: &Device) -> Result<Self> {
        config.validate()?;
        let model_config = config
            .model_config
            .clone()
            .context("bonus_config.model_config is not set.")?;
        let mut varmap = VarMap::new();
        let model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).set_prefix("bonus");
            B::build(vb, model_config)?
        };
        if let Some(path) = &config.model_path {
            varmap.load(path)?;
            info!("Load bonus network parameters from {:?}", path);
        }

        let obs_normalization = match (&config.obs_mean, &config.obs_std) {
            (Some(mean), Some(std)) => {
                info!("Observations are standardized before the bonus network");
                let mean = Tensor::from_slice(mean.as_slice(), (1, mean.len()), device)?;
                let std = Tensor::from_slice(std.as_slice(), (1, std.len()), device)?;
                Some((mean, std))
            }
            _ => None,
        };

        Ok(Self {
            varmap,
            model,
            obs_normalization,
            use_log: config.use_log,
        })
    }

    /// Returns the input of the bonus network, `[batch_size, obs_dim + act_dim]`.
    ///
    /// Observations are standardized when normalization is configured.
    /// Actions are passed through as is.
    pub fn input(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let obs = match &self.obs_normalization {
            Some((mean, std)) => obs.broadcast_sub(mean)?.broadcast_div(std)?,
            None => obs.clone(),
        };
        Ok(Tensor::cat(&[&obs, act], D::Minus1)?)
    }

    /// Returns the bonus, `[batch_size]`.
    ///
    /// With `use_log`, non-positive outputs of the network give `-inf` or `NaN`.
    pub fn bonus(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let xs = self.input(obs, act)?;
        let bonus = self.model.forward(&xs)?.squeeze(D::Minus1)?;
        match self.use_log {
            true => Ok(bonus.log()?),
            false => Ok(bonus),
        }
    }

    /// Variables of the bonus network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mlp::{Activation, Mlp, MlpConfig};

    fn config() -> BonusConfig<MlpConfig> {
        BonusConfig::default().model_config(MlpConfig::new(3, vec![4], 1, Activation::Sigmoid))
    }

    #[test]
    fn test_validate_normalization() {
        assert!(config().validate().is_ok());
        assert!(config()
            .obs_normalization(vec![0.0, 1.0], vec![1.0, 2.0])
            .validate()
            .is_ok());

        let mut c = config();
        c.obs_mean = Some(vec![0.0]);
        assert_eq!(
            c.validate(),
            Err(Td3BonusError::IncompleteObsNormalization {
                has_mean: true,
                has_std: false
            })
        );

        let c = config().obs_normalization(vec![0.0, 1.0], vec![1.0]);
        assert_eq!(
            c.validate(),
            Err(Td3BonusError::ObsNormalizationDim { mean: 2, std: 1 })
        );

        let c = config().obs_normalization(vec![0.0, 1.0], vec![1.0, 0.0]);
        assert_eq!(
            c.validate(),
            Err(Td3BonusError::NonPositiveObsStd {
                index: 1,
                value: 0.0
            })
        );
    }

    #[test]
    fn test_input_normalizes_observations_only() -> Result<()> {
        let device = Device::Cpu;
        let config = config().obs_normalization(vec![1.0, -1.0], vec![2.0, 0.5]);
        let evaluator = BonusEvaluator::<Mlp>::build(&config, &device)?;

        let obs = Tensor::from_slice(&[3.0f32, 0.0], (1, 2), &device)?;
        let act = Tensor::from_slice(&[5.0f32], (1, 1), &device)?;
        let xs = evaluator.input(&obs, &act)?;
        assert_eq!(xs.to_vec2::<f32>()?, vec![vec![1.0, 2.0, 5.0]]);
        Ok(())
    }

    #[test]
    fn test_bonus_shape_and_log() -> Result<()> {
        let device = Device::Cpu;
        let obs = Tensor::zeros((4, 2), DType::F32, &device)?;
        let act = Tensor::zeros((4, 1), DType::F32, &device)?;

        let evaluator = BonusEvaluator::<Mlp>::build(&config(), &device)?;
        let raw = evaluator.bonus(&obs, &act)?;
        assert_eq!(raw.dims(), &[4]);

        // sigmoid output lies in (0, 1), so its log is finite and negative
        let evaluator = BonusEvaluator::<Mlp>::build(&config().use_log(true), &device)?;
        let log_bonus = evaluator.bonus(&obs, &act)?.to_vec1::<f32>()?;
        assert!(log_bonus.iter().all(|b| b.is_finite() && *b < 0.0));
        Ok(())
    }
}
