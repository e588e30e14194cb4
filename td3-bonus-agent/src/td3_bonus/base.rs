use super::{BonusEvaluator, Td3BonusConfig};
use crate::{
    error::Td3BonusError,
    model::{SubModel1, SubModel2},
    util::{Critic, CriticLoss, DeterministicActor, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use log::{debug, info, trace};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::BTreeMap,
    convert::TryInto,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};
use td3_bonus_core::{
    record::{Record, RecordValue},
    Agent, Configurable, ReplayBufferBase, TransitionBatch,
};

/// Returns target policy smoothing noise with the shape of `like`.
///
/// Each element is drawn from `N(0, noise^2)` and clipped to `[-clip, clip]`.
pub fn smoothing_noise(like: &Tensor, noise: f64, clip: f64) -> Result<Tensor> {
    Ok((like.randn_like(0.0, 1.0)? * noise)?.clamp(-clip, clip)?)
}

/// Critic target and its ingredients, all `[batch_size]` and detached.
pub struct TargetValues {
    /// Regression target of both critics.
    pub q_target: Tensor,

    /// Minimum of the two target critics, before the bonus.
    pub min_target_q: Tensor,

    /// Bonus added to the minimum, before multiplied by `beta`.
    pub critic_bonus: Option<Tensor>,
}

/// Outputs of a critic update, all detached.
pub struct CriticOutputs {
    /// Loss of the first critic, scalar.
    pub qf1_loss: Tensor,

    /// Loss of the second critic, scalar.
    pub qf2_loss: Tensor,

    /// Predictions of the first critic, `[batch_size]`.
    pub q1_pred: Tensor,

    /// Predictions of the second critic, `[batch_size]`.
    pub q2_pred: Tensor,
}

/// Actor objective and its ingredients.
pub struct ActorOutputs {
    /// `-mean(q)` where `q` optionally includes the bonus, scalar.
    pub policy_loss: Tensor,

    /// Actions of the trained policy, `[batch_size, act_dim]`.
    pub policy_actions: Tensor,

    /// Bonus of the policy actions, before multiplied by `beta`.
    pub actor_bonus: Option<Tensor>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// TD3 agent with an additive bonus signal.
///
/// One call of [`Td3Bonus::train_step`] runs the following stages:
///
/// ```mermaid
/// graph LR
///     Batch --> Target[Target value]
///     Bonus[Bonus evaluator] -. detached .-> Target
///     Target --> Critics[Critic update]
///     Critics --> Due{counter % period == 0}
///     Due -- yes --> Actor[Actor update]
///     Bonus -. with gradient .-> Actor
///     Actor --> Sync[Soft update of targets]
///     Due -- no --> Stats[Diagnostics]
///     Sync --> Stats
/// ```
///
/// The critics are updated in every step. The actor and the three target
/// networks are updated when the step counter, before incremented, is a
/// multiple of `policy_and_target_update_period`. Diagnostics are refreshed
/// only in the first step after [`Td3Bonus::end_epoch`].
pub struct Td3Bonus<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    B: SubModel1<Input = Tensor, Output = Tensor>,
{
    qf1: Critic<Q>,
    qf2: Critic<Q>,
    actor: DeterministicActor<P>,
    bonus: Option<BonusEvaluator<B>>,
    beta: f64,
    use_bonus_critic: bool,
    use_bonus_policy: bool,
    target_policy_noise: f64,
    target_policy_noise_clip: f64,
    discount: f64,
    reward_scale: f64,
    policy_and_target_update_period: usize,
    tau: f64,
    critic_loss: CriticLoss,
    batch_size: usize,
    device: Device,
    eval_statistics: Record,
    need_to_update_eval_statistics: bool,
    n_train_steps_total: usize,
}

impl<Q, P, B> Td3Bonus<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: Clone,
{
    fn bonus_evaluator(&self) -> Result<&BonusEvaluator<B>> {
        self.bonus.as_ref().context("bonus network is not built.")
    }

    /// Computes the critic target with freshly sampled smoothing noise.
    ///
    /// `rewards` and `terminals` are `[batch_size]` with terminals in {0, 1}.
    pub fn compute_target(
        &self,
        next_obs: &Tensor,
        rewards: &Tensor,
        terminals: &Tensor,
    ) -> Result<TargetValues> {
        let next_actions = self.actor.forward_tgt(next_obs)?;
        let noise = smoothing_noise(
            &next_actions,
            self.target_policy_noise,
            self.target_policy_noise_clip,
        )?;
        self.target_from_next_actions(next_obs, &next_actions, &noise, rewards, terminals)
    }

    /// Computes the critic target with the given smoothing noise.
    ///
    /// `noise` must have the shape of the actions. It is added as is,
    /// without clipping.
    pub fn compute_target_with_noise(
        &self,
        next_obs: &Tensor,
        rewards: &Tensor,
        terminals: &Tensor,
        noise: &Tensor,
    ) -> Result<TargetValues> {
        let next_actions = self.actor.forward_tgt(next_obs)?;
        self.target_from_next_actions(next_obs, &next_actions, noise, rewards, terminals)
    }

    fn target_from_next_actions(
        &self,
        next_obs: &Tensor,
        next_actions: &Tensor,
        noise: &Tensor,
        rewards: &Tensor,
        terminals: &Tensor,
    ) -> Result<TargetValues> {
        // No clipping to the action bounds
        let noisy_next_actions = (next_actions + noise)?;
        let target_q1 = self.qf1.forward_tgt(next_obs, &noisy_next_actions)?;
        let target_q2 = self.qf2.forward_tgt(next_obs, &noisy_next_actions)?;
        let min_target_q = target_q1.minimum(&target_q2)?.detach();

        let (value, critic_bonus) = match self.use_bonus_critic {
            true => {
                let bonus = self
                    .bonus_evaluator()?
                    .bonus(next_obs, &noisy_next_actions)?
                    .detach();
                ((&min_target_q + (&bonus * self.beta)?)?, Some(bonus))
            }
            false => (min_target_q.clone(), None),
        };

        let not_done = terminals.affine(-1.0, 1.0)?;
        let q_target = ((rewards * self.reward_scale)? + ((not_done * self.discount)? * value)?)?;

        Ok(TargetValues {
            q_target: q_target.detach(),
            min_target_q,
            critic_bonus,
        })
    }

    /// Returns the action values of the two target critics, `[batch_size]` each.
    pub fn target_q_values(&self, obs: &Tensor, act: &Tensor) -> Result<(Tensor, Tensor)> {
        Ok((
            self.qf1.forward_tgt(obs, act)?.detach(),
            self.qf2.forward_tgt(obs, act)?.detach(),
        ))
    }

    /// Applies one gradient step on each critic towards `q_target`.
    pub fn update_critics(
        &mut self,
        obs: &Tensor,
        act: &Tensor,
        q_target: &Tensor,
    ) -> Result<CriticOutputs> {
        let q1_pred = self.qf1.forward(obs, act)?;
        let q2_pred = self.qf2.forward(obs, act)?;
        let qf1_loss = self.critic_loss.loss(&q1_pred, q_target)?;
        let qf2_loss = self.critic_loss.loss(&q2_pred, q_target)?;

        trace!("Critic steps");
        self.qf1.backward_step(&qf1_loss)?;
        self.qf2.backward_step(&qf2_loss)?;

        Ok(CriticOutputs {
            qf1_loss: qf1_loss.detach(),
            qf2_loss: qf2_loss.detach(),
            q1_pred: q1_pred.detach(),
            q2_pred: q2_pred.detach(),
        })
    }

    /// Computes the actor objective on `obs` without updating the actor.
    ///
    /// Only the first critic is used. The bonus, when used in the objective,
    /// is not detached.
    pub fn actor_objective(&self, obs: &Tensor) -> Result<ActorOutputs> {
        let policy_actions = self.actor.forward(obs)?;
        let q_output = self.qf1.forward(obs, &policy_actions)?;

        let (q_output, actor_bonus) = match self.use_bonus_policy {
            true => {
                let bonus = self.bonus_evaluator()?.bonus(obs, &policy_actions)?;
                ((q_output + (&bonus * self.beta)?)?, Some(bonus))
            }
            false => (q_output, None),
        };
        let policy_loss = q_output.mean_all()?.neg()?;

        Ok(ActorOutputs {
            policy_loss,
            policy_actions,
            actor_bonus,
        })
    }

    /// Applies one gradient step on the policy.
    pub fn update_actor(&mut self, obs: &Tensor) -> Result<ActorOutputs> {
        let outputs = self.actor_objective(obs)?;
        self.actor.backward_step(&outputs.policy_loss)?;
        Ok(outputs)
    }

    /// Moves the target policy and both target critics towards the trained networks.
    pub fn soft_update_targets(&mut self) -> Result<()> {
        self.actor.soft_update(self.tau)?;
        self.qf1.soft_update(self.tau)?;
        self.qf2.soft_update(self.tau)?;
        Ok(())
    }

    /// Returns `true` if the actor and target networks are updated in the next step.
    pub fn is_update_due(&self) -> bool {
        self.n_train_steps_total % self.policy_and_target_update_period == 0
    }

    /// Runs a training step on a batch of transitions.
    pub fn train_step<T>(&mut self, batch: T) -> Result<()>
    where
        T: TransitionBatch,
        T::ObsBatch: Into<Tensor>,
        T::ActBatch: Into<Tensor>,
    {
        let (obs, act, next_obs, reward, is_terminated) = batch.unpack();
        let obs = Into::<Tensor>::into(obs).to_device(&self.device)?;
        let act = Into::<Tensor>::into(act).to_device(&self.device)?;
        let next_obs = Into::<Tensor>::into(next_obs).to_device(&self.device)?;
        let batch_size = obs.dim(0)?;
        check_batch(batch_size, &act, &next_obs, &reward, &is_terminated)?;
        let rewards = Tensor::from_slice(&reward, (batch_size,), &self.device)?;
        let terminals = {
            let t = is_terminated.iter().map(|&t| t as f32).collect::<Vec<_>>();
            Tensor::from_slice(&t, (batch_size,), &self.device)?
        };

        trace!("Compute target");
        let target = self.compute_target(&next_obs, &rewards, &terminals)?;

        trace!("Update critics");
        let critic = self.update_critics(&obs, &act, &target.q_target)?;

        let actor = match self.is_update_due() {
            true => {
                debug!("Update actor and targets at step {}", self.n_train_steps_total);
                let actor = self.update_actor(&obs)?;
                self.soft_update_targets()?;
                Some(actor)
            }
            false => None,
        };

        if self.need_to_update_eval_statistics {
            trace!("Update diagnostics");
            let actor = match actor {
                Some(actor) => actor,
                None => self.actor_objective(&obs)?,
            };
            self.eval_statistics = self.statistics(&target, &critic, &actor)?;
            self.need_to_update_eval_statistics = false;
        }

        self.n_train_steps_total += 1;
        Ok(())
    }

    fn statistics(
        &self,
        target: &TargetValues,
        critic: &CriticOutputs,
        actor: &ActorOutputs,
    ) -> Result<Record> {
        let mut record = Record::from_slice(&[
            ("qf1_loss", RecordValue::Scalar(critic.qf1_loss.to_scalar::<f32>()?)),
            ("qf2_loss", RecordValue::Scalar(critic.qf2_loss.to_scalar::<f32>()?)),
            (
                "policy_loss",
                RecordValue::Scalar(actor.policy_loss.to_scalar::<f32>()?),
            ),
        ]);
        let bellman_errors_1 = (&critic.q1_pred - &target.q_target)?.sqr()?;
        let bellman_errors_2 = (&critic.q2_pred - &target.q_target)?.sqr()?;

        record.insert_summary("q1_predictions", &to_vec(&critic.q1_pred)?)?;
        record.insert_summary("q2_predictions", &to_vec(&critic.q2_pred)?)?;
        record.insert_summary("q_targets", &to_vec(&target.q_target)?)?;
        record.insert_summary("bellman_errors_1", &to_vec(&bellman_errors_1)?)?;
        record.insert_summary("bellman_errors_2", &to_vec(&bellman_errors_2)?)?;
        record.insert_summary("policy_action", &to_vec(&actor.policy_actions)?)?;
        if let Some(bonus) = &actor.actor_bonus {
            record.insert_summary("actor_bonus", &to_vec(bonus)?)?;
        }
        if let Some(bonus) = &target.critic_bonus {
            record.insert_summary("critic_bonus", &to_vec(bonus)?)?;
        }

        Ok(record)
    }

    /// Returns the diagnostics recorded in the latest refresh.
    pub fn diagnostics(&self) -> &Record {
        &self.eval_statistics
    }

    /// Marks the diagnostics stale so that the next step refreshes them.
    pub fn end_epoch(&mut self, _epoch: usize) {
        self.need_to_update_eval_statistics = true;
    }

    /// Returns the number of training steps taken so far.
    pub fn n_train_steps(&self) -> usize {
        self.n_train_steps_total
    }

    /// Returns the variables of all networks subject to training or tracking.
    pub fn networks(&self) -> Vec<(&'static str, &VarMap)> {
        vec![
            ("policy", self.actor.varmap()),
            ("qf1", self.qf1.varmap()),
            ("qf2", self.qf2.varmap()),
            ("target_policy", self.actor.varmap_tgt()),
            ("target_qf1", self.qf1.varmap_tgt()),
            ("target_qf2", self.qf2.varmap_tgt()),
        ]
    }

    /// Returns the networks to be checkpointed.
    pub fn snapshot(&self) -> BTreeMap<&'static str, &VarMap> {
        BTreeMap::from([
            ("qf1", self.qf1.varmap()),
            ("qf2", self.qf2.varmap()),
            ("trained_policy", self.actor.varmap()),
            ("target_policy", self.actor.varmap_tgt()),
        ])
    }

    /// Saves the six networks as `{name}.safetensors` in `path`.
    pub fn save_params(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;
        let mut paths = Vec::new();
        for (name, varmap) in self.networks() {
            let file = path.join(format!("{}.safetensors", name));
            varmap.save(&file)?;
            paths.push(file);
        }
        info!("Save TD3 agent parameters into {:?}", path);
        Ok(paths)
    }

    /// Loads the six networks saved with [`Td3Bonus::save_params`].
    pub fn load_params(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = |name: &str| path.join(format!("{}.safetensors", name));
        self.actor.load(file("policy"), file("target_policy"))?;
        self.qf1.load(file("qf1"), file("target_qf1"))?;
        self.qf2.load(file("qf2"), file("target_qf2"))?;
        info!("Load TD3 agent parameters from {:?}", path);
        Ok(())
    }

    /// Returns the bonus evaluator if the bonus network is built.
    pub fn bonus(&self) -> Option<&BonusEvaluator<B>> {
        self.bonus.as_ref()
    }
}

fn to_vec(t: &Tensor) -> Result<Vec<f32>> {
    Ok(t.flatten_all()?.to_vec1::<f32>()?)
}

fn check_batch(
    batch_size: usize,
    act: &Tensor,
    next_obs: &Tensor,
    reward: &[f32],
    is_terminated: &[i8],
) -> Result<(), Td3BonusError> {
    if batch_size == 0 {
        return Err(Td3BonusError::EmptyBatch);
    }
    let sizes = [
        ("act", act.dims().first().copied().unwrap_or(0)),
        ("next_obs", next_obs.dims().first().copied().unwrap_or(0)),
        ("reward", reward.len()),
        ("is_terminated", is_terminated.len()),
    ];
    for (field, actual) in sizes {
        if actual != batch_size {
            return Err(Td3BonusError::BatchSizeMismatch {
                field,
                expected: batch_size,
                actual,
            });
        }
    }
    match is_terminated.iter().find(|&&t| t != 0 && t != 1) {
        Some(&t) => Err(Td3BonusError::InvalidTerminal(t)),
        None => Ok(()),
    }
}

impl<Q, P, B> Configurable for Td3Bonus<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    type Config = Td3BonusConfig<Q, P, B>;

    /// Constructs [`Td3Bonus`] agent.
    fn build(config: Self::Config) -> Result<Self> {
        config.validate()?;
        let device: Device = config.device.context("device is not set.")?.try_into()?;
        let qf1 = Critic::build(config.critic_config.clone(), &device)?;
        let qf2 = Critic::build(config.critic_config.clone(), &device)?;
        let actor = DeterministicActor::build(config.actor_config.clone(), &device)?;

        let bonus_config = &config.bonus_config;
        let bonus = match bonus_config.model_config.is_some() {
            true => Some(BonusEvaluator::build(bonus_config, &device)?),
            false => None,
        };
        info!(
            "Bonus in critic target: {}, in actor objective: {}, beta: {}, log: {}",
            bonus_config.use_bonus_critic,
            bonus_config.use_bonus_policy,
            bonus_config.beta,
            bonus_config.use_log
        );

        Ok(Self {
            qf1,
            qf2,
            actor,
            bonus,
            beta: bonus_config.beta,
            use_bonus_critic: bonus_config.use_bonus_critic,
            use_bonus_policy: bonus_config.use_bonus_policy,
            target_policy_noise: config.target_policy_noise,
            target_policy_noise_clip: config.target_policy_noise_clip,
            discount: config.discount,
            reward_scale: config.reward_scale,
            policy_and_target_update_period: config.policy_and_target_update_period,
            tau: config.tau,
            critic_loss: config.critic_loss,
            batch_size: config.batch_size,
            device,
            eval_statistics: Record::empty(),
            need_to_update_eval_statistics: true,
            n_train_steps_total: 0,
        })
    }
}

impl<Q, P, B, R> Agent<R> for Td3Bonus<Q, P, B>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: Clone,
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: Clone,
    R: ReplayBufferBase,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Tensor>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record> {
        let batch = buffer.batch(self.batch_size)?;
        self.train_step(batch)?;
        Ok(self.eval_statistics.clone())
    }

    fn end_epoch(&mut self, epoch: usize) {
        Td3Bonus::end_epoch(self, epoch);
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        Td3Bonus::save_params(self, path)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        Td3Bonus::load_params(self, path)
    }
}
