//! Configuration of TD3 agent with bonus.
use super::BonusConfig;
use crate::{
    error::Td3BonusError,
    model::{SubModel1, SubModel2},
    opt::OptimizerConfig,
    util::{ActorConfig, CriticConfig, CriticLoss, OutDim},
    Device,
};
use anyhow::Result;
use candle_core::Tensor;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Td3Bonus`](super::Td3Bonus).
///
/// `Q`, `P` and `B` are the critic, policy and bonus networks.
/// The two critics share [`CriticConfig`] but are built as independent networks.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Td3BonusConfig<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Configuration of the actor model.
    pub actor_config: ActorConfig<P::Config>,

    /// Configuration of the critic models.
    pub critic_config: CriticConfig<Q::Config>,

    /// Configuration of the bonus signal.
    pub bonus_config: BonusConfig<B::Config>,

    /// Standard deviation of the target policy smoothing noise.
    pub target_policy_noise: f64,

    /// Bound of the absolute value of the target policy smoothing noise.
    pub target_policy_noise_clip: f64,

    /// Discount factor.
    pub discount: f64,

    /// Scale of rewards in the critic target.
    pub reward_scale: f64,

    /// The actor and the target networks are updated once in this number of steps.
    pub policy_and_target_update_period: usize,

    /// Soft update coefficient of the target networks.
    pub tau: f64,

    /// Type of critic loss function.
    pub critic_loss: CriticLoss,

    /// Batch size for training.
    pub batch_size: usize,

    /// Device for the models.
    pub device: Option<Device>,
}

impl<Q, P, B> Clone for Td3BonusConfig<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            actor_config: self.actor_config.clone(),
            critic_config: self.critic_config.clone(),
            bonus_config: self.bonus_config.clone(),
            target_policy_noise: self.target_policy_noise,
            target_policy_noise_clip: self.target_policy_noise_clip,
            discount: self.discount,
            reward_scale: self.reward_scale,
            policy_and_target_update_period: self.policy_and_target_update_period,
            tau: self.tau,
            critic_loss: self.critic_loss,
            batch_size: self.batch_size,
            device: self.device,
        }
    }
}

impl<Q, P, B> Default for Td3BonusConfig<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            bonus_config: Default::default(),
            target_policy_noise: 0.2,
            target_policy_noise_clip: 0.5,
            discount: 0.99,
            reward_scale: 1.0,
            policy_and_target_update_period: 2,
            tau: 0.005,
            critic_loss: CriticLoss::Mse,
            batch_size: 256,
            device: None,
        }
    }
}

impl<Q, P, B> Td3BonusConfig<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Configuration of the actor.
    pub fn actor_config(mut self, actor_config: ActorConfig<P::Config>) -> Self {
        self.actor_config = actor_config;
        self
    }

    /// Configuration of the critics.
    pub fn critic_config(mut self, critic_config: CriticConfig<Q::Config>) -> Self {
        self.critic_config = critic_config;
        self
    }

    /// Configuration of the bonus signal.
    pub fn bonus_config(mut self, bonus_config: BonusConfig<B::Config>) -> Self {
        self.bonus_config = bonus_config;
        self
    }

    /// Standard deviation of the target policy smoothing noise.
    pub fn target_policy_noise(mut self, v: f64) -> Self {
        self.target_policy_noise = v;
        self
    }

    /// Clipping bound of the target policy smoothing noise.
    pub fn target_policy_noise_clip(mut self, v: f64) -> Self {
        self.target_policy_noise_clip = v;
        self
    }

    /// Discount factor.
    pub fn discount(mut self, v: f64) -> Self {
        self.discount = v;
        self
    }

    /// Reward scale.
    pub fn reward_scale(mut self, v: f64) -> Self {
        self.reward_scale = v;
        self
    }

    /// Period of the delayed update of the actor and the target networks.
    pub fn policy_and_target_update_period(mut self, v: usize) -> Self {
        self.policy_and_target_update_period = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Critic loss function.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Learning rate of the policy, keeping the optimizer algorithm.
    pub fn policy_learning_rate(mut self, lr: f64) -> Self {
        self.actor_config.opt_config = self.actor_config.opt_config.learning_rate(lr);
        self
    }

    /// Learning rate of both critics, keeping the optimizer algorithm.
    pub fn qf_learning_rate(mut self, lr: f64) -> Self {
        self.critic_config.opt_config = self.critic_config.opt_config.learning_rate(lr);
        self
    }

    /// Optimizer of the policy and the critics.
    ///
    /// The learning rates set so far are kept.
    pub fn optimizer(mut self, opt_config: OptimizerConfig) -> Self {
        let lr_pi = self.actor_config.opt_config.get_learning_rate();
        let lr_qf = self.critic_config.opt_config.get_learning_rate();
        self.actor_config.opt_config = opt_config.clone().learning_rate(lr_pi);
        self.critic_config.opt_config = opt_config.learning_rate(lr_qf);
        self
    }

    /// Checks hyperparameters and required model configurations.
    pub fn validate(&self) -> Result<(), Td3BonusError> {
        if self.policy_and_target_update_period == 0 {
            return Err(Td3BonusError::ZeroUpdatePeriod);
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(Td3BonusError::InvalidTau(self.tau));
        }
        for (name, value) in [
            ("target_policy_noise", self.target_policy_noise),
            ("target_policy_noise_clip", self.target_policy_noise_clip),
        ] {
            if value < 0.0 || value.is_nan() {
                return Err(Td3BonusError::NegativeNoise { name, value });
            }
        }
        if self.batch_size == 0 {
            return Err(Td3BonusError::ZeroBatchSize);
        }
        if self.actor_config.policy_config.is_none() {
            return Err(Td3BonusError::MissingConfig("actor_config.policy_config"));
        }
        if self.critic_config.q_config.is_none() {
            return Err(Td3BonusError::MissingConfig("critic_config.q_config"));
        }
        if self.bonus_config.is_active() && self.bonus_config.model_config.is_none() {
            return Err(Td3BonusError::MissingConfig("bonus_config.model_config"));
        }
        self.bonus_config.validate()
    }

    /// Constructs [`Td3BonusConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of TD3 agent from {:?}", path.as_ref());
        Ok(b)
    }

    /// Saves [`Td3BonusConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of TD3 agent into {:?}", path.as_ref());
        Ok(())
    }
}
