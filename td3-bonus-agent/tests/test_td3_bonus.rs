use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;
use td3_bonus_agent::{
    error::Td3BonusError,
    mlp::{Activation, Mlp, MlpConfig},
    model::SubModel1,
    opt::OptimizerConfig,
    td3_bonus::{smoothing_noise, BonusConfig, BonusEvaluator, Td3Bonus, Td3BonusConfig},
    util::{ActorConfig, CriticConfig},
    TensorTransitionBatch,
};
use td3_bonus_core::{Agent, Configurable, ReplayBufferBase};
use tempdir::TempDir;

const DIM_OBS: usize = 3;
const DIM_ACT: usize = 2;
const BATCH_SIZE: usize = 4;
const DISCOUNT: f64 = 0.99;
const BETA: f64 = 0.1;
const TAU: f64 = 0.005;

/// Bonus network returning a constant, without variables.
struct ConstBonus {
    value: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct ConstBonusConfig {
    value: f32,
}

impl SubModel1 for ConstBonus {
    type Config = ConstBonusConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(_vb: VarBuilder, config: Self::Config) -> Result<Self> {
        Ok(Self {
            value: config.value,
        })
    }

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        Ok(Tensor::full(self.value, (xs.dim(0)?, 1), xs.device())?)
    }
}

type Td3 = Td3Bonus<Mlp, Mlp, ConstBonus>;
type Td3Config = Td3BonusConfig<Mlp, Mlp, ConstBonus>;
type Td3Mlp = Td3Bonus<Mlp, Mlp, Mlp>;

fn config() -> Td3Config {
    config_with()
}

fn config_with<B>() -> Td3BonusConfig<Mlp, Mlp, B>
where
    B: SubModel1<Input = Tensor, Output = Tensor>,
    B::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    let actor_config = ActorConfig::default().policy_config(MlpConfig::new(
        DIM_OBS as _,
        vec![16, 16],
        DIM_ACT as _,
        Activation::Tanh,
    ));
    let critic_config = CriticConfig::default().q_config(MlpConfig::new(
        (DIM_OBS + DIM_ACT) as _,
        vec![16, 16],
        1,
        Activation::None,
    ));
    Td3BonusConfig::default()
        .actor_config(actor_config)
        .critic_config(critic_config)
        .discount(DISCOUNT)
        .tau(TAU)
        .policy_and_target_update_period(2)
        .batch_size(BATCH_SIZE)
        .device(td3_bonus_agent::Device::Cpu)
}

fn bonus_config(value: f32) -> BonusConfig<ConstBonusConfig> {
    BonusConfig::default()
        .model_config(ConstBonusConfig { value })
        .beta(BETA)
}

/// Differentiable bonus network.
fn mlp_bonus_config() -> BonusConfig<MlpConfig> {
    BonusConfig::default()
        .model_config(MlpConfig::new(
            (DIM_OBS + DIM_ACT) as _,
            vec![16],
            1,
            Activation::Sigmoid,
        ))
        .beta(10.0)
}

fn randn(shape: (usize, usize)) -> Result<Tensor> {
    Ok(Tensor::randn(0f32, 1f32, shape, &Device::Cpu)?)
}

fn batch(is_terminated: Vec<i8>) -> Result<TensorTransitionBatch> {
    let n = is_terminated.len();
    let reward = (0..n).map(|i| i as f32 * 0.5 - 1.0).collect();
    Ok(TensorTransitionBatch::new(
        randn((n, DIM_OBS))?,
        randn((n, DIM_ACT))?.clamp(-1f32, 1f32)?,
        randn((n, DIM_OBS))?,
        reward,
        is_terminated,
    ))
}

/// All parameters of the network, ordered by variable names.
fn params(varmap: &VarMap) -> Result<Vec<f32>> {
    let data = varmap.data().lock().unwrap();
    let mut names = data.keys().cloned().collect::<Vec<_>>();
    names.sort();
    let mut vs = vec![];
    for name in names {
        vs.extend(data[&name].as_tensor().flatten_all()?.to_vec1::<f32>()?);
    }
    Ok(vs)
}

fn network_params(agent: &Td3) -> Result<Vec<(&'static str, Vec<f32>)>> {
    agent
        .networks()
        .into_iter()
        .map(|(name, varmap)| -> Result<(&'static str, Vec<f32>)> {
            Ok((name, params(varmap)?))
        })
        .collect()
}

fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() <= tol, "{} != {}", x, y);
    }
}

#[test]
fn test_terminal_rows_reduce_to_scaled_reward() -> Result<()> {
    let agent = Td3::build(config().reward_scale(2.0))?;
    let next_obs = randn((BATCH_SIZE, DIM_OBS))?;
    let rewards = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], (4,), &Device::Cpu)?;
    let terminals = Tensor::from_slice(&[1.0f32, 0.0, 1.0, 0.0], (4,), &Device::Cpu)?;

    let target = agent.compute_target(&next_obs, &rewards, &terminals)?;
    assert_eq!(target.q_target.dims(), &[BATCH_SIZE]);
    let q_target = target.q_target.to_vec1::<f32>()?;
    assert!(q_target.iter().all(|q| q.is_finite()));
    assert_eq!(q_target[0], 2.0);
    assert_eq!(q_target[2], 6.0);
    Ok(())
}

#[test]
fn test_smoothing_noise_is_clipped() -> Result<()> {
    let like = Tensor::zeros((1000, DIM_ACT), DType::F32, &Device::Cpu)?;
    let noise = smoothing_noise(&like, 1.0, 0.5)?;
    assert_eq!(noise.dims(), like.dims());
    let noise = noise.flatten_all()?.to_vec1::<f32>()?;
    assert!(noise.iter().all(|n| (-0.5..=0.5).contains(n)));

    let noise = smoothing_noise(&like, 0.0, 0.5)?;
    assert!(noise.flatten_all()?.to_vec1::<f32>()?.iter().all(|n| *n == 0.0));
    Ok(())
}

#[test]
fn test_pessimistic_target() -> Result<()> {
    let agent = Td3::build(config().discount(1.0))?;
    let next_obs = randn((BATCH_SIZE, DIM_OBS))?;
    let rewards = Tensor::zeros((BATCH_SIZE,), DType::F32, &Device::Cpu)?;
    let terminals = Tensor::zeros((BATCH_SIZE,), DType::F32, &Device::Cpu)?;
    let noise = Tensor::zeros((BATCH_SIZE, DIM_ACT), DType::F32, &Device::Cpu)?;

    let target = agent.compute_target_with_noise(&next_obs, &rewards, &terminals, &noise)?;
    assert!(target.critic_bonus.is_none());

    // Without noise, the target critics see the actions of the target policy
    let next_actions = {
        let snapshot = agent.snapshot();
        assert!(snapshot.contains_key("target_policy"));
        let policy = MlpConfig::new(DIM_OBS as _, vec![16, 16], DIM_ACT as _, Activation::Tanh);
        let vb = VarBuilder::from_varmap(snapshot["target_policy"], DType::F32, &Device::Cpu)
            .set_prefix("actor");
        <Mlp as SubModel1>::build(vb, policy)?.forward(&next_obs)?
    };
    let (q1, q2) = agent.target_q_values(&next_obs, &next_actions)?;
    let (q1, q2) = (q1.to_vec1::<f32>()?, q2.to_vec1::<f32>()?);
    let min_q = target.min_target_q.to_vec1::<f32>()?;
    let q_target = target.q_target.to_vec1::<f32>()?;

    for i in 0..BATCH_SIZE {
        assert!(min_q[i] <= q1[i] && min_q[i] <= q2[i]);
        assert!(min_q[i] == q1[i] || min_q[i] == q2[i]);
        assert_eq!(q_target[i], min_q[i]);
    }
    Ok(())
}

#[test]
fn test_critic_bonus_adds_beta_times_bonus() -> Result<()> {
    let agent = Td3::build(
        config().bonus_config(bonus_config(0.5).use_bonus_critic(true).use_log(true)),
    )?;
    let next_obs = randn((BATCH_SIZE, DIM_OBS))?;
    let rewards = Tensor::from_slice(&[0.5f32, -1.0, 2.0, 0.0], (4,), &Device::Cpu)?;
    let terminals = Tensor::from_slice(&[0.0f32, 0.0, 1.0, 0.0], (4,), &Device::Cpu)?;
    let noise = Tensor::zeros((BATCH_SIZE, DIM_ACT), DType::F32, &Device::Cpu)?;

    let target = agent.compute_target_with_noise(&next_obs, &rewards, &terminals, &noise)?;
    let bonus = target.critic_bonus.unwrap().to_vec1::<f32>()?;
    assert_close(&bonus, &[0.5f32.ln(); BATCH_SIZE], 1e-6);

    let min_q = target.min_target_q.to_vec1::<f32>()?;
    let q_target = target.q_target.to_vec1::<f32>()?;
    let rewards = rewards.to_vec1::<f32>()?;
    for i in [0, 1, 3] {
        let value = (q_target[i] - rewards[i]) / DISCOUNT as f32;
        assert!((value - min_q[i] - BETA as f32 * 0.5f32.ln()).abs() < 1e-4);
    }
    assert_eq!(q_target[2], 2.0);
    Ok(())
}

#[test]
fn test_log_of_nonpositive_bonus() -> Result<()> {
    let obs = randn((BATCH_SIZE, DIM_OBS))?;
    let act = randn((BATCH_SIZE, DIM_ACT))?;

    let evaluator =
        BonusEvaluator::<ConstBonus>::build(&bonus_config(0.0).use_log(true), &Device::Cpu)?;
    let bonus = evaluator.bonus(&obs, &act)?.to_vec1::<f32>()?;
    assert!(bonus.iter().all(|b| *b == f32::NEG_INFINITY));

    let evaluator =
        BonusEvaluator::<ConstBonus>::build(&bonus_config(-1.0).use_log(true), &Device::Cpu)?;
    let bonus = evaluator.bonus(&obs, &act)?.to_vec1::<f32>()?;
    assert!(bonus.iter().all(|b| b.is_nan()));

    let evaluator = BonusEvaluator::<ConstBonus>::build(&bonus_config(-1.0), &Device::Cpu)?;
    let bonus = evaluator.bonus(&obs, &act)?.to_vec1::<f32>()?;
    assert_eq!(bonus, vec![-1.0; BATCH_SIZE]);
    Ok(())
}

#[test]
fn test_delayed_update() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut agent = Td3::build(config())?;
    let is_updated = |before: &[(&str, Vec<f32>)], after: &[(&str, Vec<f32>)], name: &str| {
        let i = before.iter().position(|(n, _)| *n == name).unwrap();
        before[i].1 != after[i].1
    };

    for step in 0..3 {
        assert_eq!(agent.is_update_due(), step % 2 == 0);
        let before = network_params(&agent)?;
        agent.train_step(batch(vec![0, 0, 1, 0])?)?;
        let after = network_params(&agent)?;

        // Critics are updated in every step
        assert!(is_updated(&before, &after, "qf1"));
        assert!(is_updated(&before, &after, "qf2"));
        for name in ["policy", "target_policy", "target_qf1", "target_qf2"] {
            assert_eq!(is_updated(&before, &after, name), step % 2 == 0, "{}", name);
        }
    }
    assert_eq!(agent.n_train_steps(), 3);
    Ok(())
}

#[test]
fn test_soft_update_tau() -> Result<()> {
    // tau = 0 leaves the targets as they are
    let mut agent = Td3::build(config().tau(0.0).policy_and_target_update_period(1))?;
    let before = network_params(&agent)?;
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;
    let after = network_params(&agent)?;
    assert_eq!(before[3..], after[3..]);

    // tau = 1 copies the trained networks
    let mut agent = Td3::build(config().tau(1.0).policy_and_target_update_period(1))?;
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;
    let after = network_params(&agent)?;
    for i in 0..3 {
        assert_eq!(after[i].1, after[i + 3].1, "{}", after[i + 3].0);
    }
    Ok(())
}

#[test]
fn test_diagnostics() -> Result<()> {
    let config = config().bonus_config(
        bonus_config(0.5)
            .use_bonus_critic(true)
            .use_bonus_policy(true),
    );
    let mut agent = Td3::build(config)?;
    assert!(agent.diagnostics().is_empty());

    // The first step refreshes the diagnostics
    agent.train_step(batch(vec![0, 1, 0, 0])?)?;
    let record = agent.diagnostics().clone();
    for key in [
        "q1_predictions",
        "q2_predictions",
        "q_targets",
        "bellman_errors_1",
        "bellman_errors_2",
        "policy_action",
        "actor_bonus",
        "critic_bonus",
    ] {
        assert!(record.get_summary(key).is_ok(), "{}", key);
    }
    assert!(record.get_scalar("qf1_loss")? >= 0.0);
    assert!(record.get_scalar("qf2_loss")? >= 0.0);
    assert!(record.get_scalar("policy_loss")?.is_finite());
    assert!(record.get_summary("bellman_errors_1")?.min >= 0.0);
    assert_eq!(record.get_summary("actor_bonus")?.mean, 0.5);

    // Stale until the end of the epoch; step 1 has no actor update
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;
    assert_eq!(
        agent.diagnostics().get_summary("q_targets")?,
        record.get_summary("q_targets")?
    );

    agent.end_epoch(0);
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;
    assert_ne!(
        agent.diagnostics().get_summary("q_targets")?,
        record.get_summary("q_targets")?
    );
    Ok(())
}

#[test]
fn test_diagnostics_without_bonus() -> Result<()> {
    let mut agent = Td3::build(config())?;
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;
    let record = agent.diagnostics();
    assert!(!record.contains_key("actor_bonus"));
    assert!(!record.contains_key("critic_bonus"));
    assert_eq!(record.len(), 9);
    Ok(())
}

#[test]
fn test_actor_bonus_in_objective() -> Result<()> {
    let dir = TempDir::new("td3_bonus")?;
    let obs = randn((BATCH_SIZE, DIM_OBS))?;

    let agent = Td3::build(config())?;
    agent.save_params(dir.path())?;
    let loss = agent.actor_objective(&obs)?.policy_loss.to_scalar::<f32>()?;

    let mut agent =
        Td3::build(config().bonus_config(bonus_config(2.0).use_bonus_policy(true)))?;
    agent.load_params(dir.path())?;
    let outputs = agent.actor_objective(&obs)?;
    let loss_bonus = outputs.policy_loss.to_scalar::<f32>()?;

    assert!(outputs.actor_bonus.is_some());
    assert!((loss - BETA as f32 * 2.0 - loss_bonus).abs() < 1e-5);
    Ok(())
}

#[test]
fn test_save_and_load_params() -> Result<()> {
    let dir = TempDir::new("td3_bonus")?;
    let mut agent = Td3::build(config())?;
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;
    let paths = agent.save_params(dir.path())?;
    assert_eq!(paths.len(), 6);
    assert!(paths.iter().all(|p| p.exists()));

    let mut agent_ = Td3::build(config())?;
    assert_ne!(network_params(&agent)?, network_params(&agent_)?);
    agent_.load_params(dir.path())?;
    assert_eq!(network_params(&agent)?, network_params(&agent_)?);
    Ok(())
}

#[test]
fn test_networks_and_snapshot() -> Result<()> {
    let agent = Td3::build(config())?;
    let names = agent
        .networks()
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec!["policy", "qf1", "qf2", "target_policy", "target_qf1", "target_qf2"]
    );

    let keys = agent.snapshot().into_keys().collect::<Vec<_>>();
    assert_eq!(keys, vec!["qf1", "qf2", "target_policy", "trained_policy"]);

    // Targets start as copies of the trained networks
    let params = network_params(&agent)?;
    for i in 0..3 {
        assert_eq!(params[i].1, params[i + 3].1);
    }
    Ok(())
}

#[test]
fn test_config_validation() -> Result<()> {
    let cases: Vec<(Td3Config, Td3BonusError)> = vec![
        (
            config().policy_and_target_update_period(0),
            Td3BonusError::ZeroUpdatePeriod,
        ),
        (config().tau(1.5), Td3BonusError::InvalidTau(1.5)),
        (
            config().target_policy_noise_clip(-0.1),
            Td3BonusError::NegativeNoise {
                name: "target_policy_noise_clip",
                value: -0.1,
            },
        ),
        (
            config().critic_config(CriticConfig::default()),
            Td3BonusError::MissingConfig("critic_config.q_config"),
        ),
        (
            config().bonus_config(BonusConfig::default().use_bonus_critic(true)),
            Td3BonusError::MissingConfig("bonus_config.model_config"),
        ),
        (
            config().bonus_config(bonus_config(1.0).obs_normalization(vec![0.0; 3], vec![1.0; 2])),
            Td3BonusError::ObsNormalizationDim { mean: 3, std: 2 },
        ),
    ];

    for (config, expected) in cases {
        let err = match Td3::build(config) {
            Ok(_) => panic!("{} is not detected", expected),
            Err(err) => err,
        };
        assert_eq!(err.downcast_ref::<Td3BonusError>(), Some(&expected));
    }
    Ok(())
}

#[test]
fn test_invalid_batch() -> Result<()> {
    let mut agent = Td3::build(config())?;

    let err = agent.train_step(batch(vec![0, 2, 0, 0])?).unwrap_err();
    assert_eq!(
        err.downcast_ref::<Td3BonusError>(),
        Some(&Td3BonusError::InvalidTerminal(2))
    );

    let b = TensorTransitionBatch::new(
        randn((BATCH_SIZE, DIM_OBS))?,
        randn((BATCH_SIZE, DIM_ACT))?,
        randn((BATCH_SIZE, DIM_OBS))?,
        vec![0.0; BATCH_SIZE - 1],
        vec![0; BATCH_SIZE],
    );
    let err = agent.train_step(b).unwrap_err();
    assert_eq!(
        err.downcast_ref::<Td3BonusError>(),
        Some(&Td3BonusError::BatchSizeMismatch {
            field: "reward",
            expected: BATCH_SIZE,
            actual: BATCH_SIZE - 1
        })
    );

    // Empty batches are rejected before any network is touched
    let before = network_params(&agent)?;
    let b = TensorTransitionBatch::new(
        Tensor::zeros((0, DIM_OBS), DType::F32, &Device::Cpu)?,
        Tensor::zeros((0, DIM_ACT), DType::F32, &Device::Cpu)?,
        Tensor::zeros((0, DIM_OBS), DType::F32, &Device::Cpu)?,
        vec![],
        vec![],
    );
    let err = agent.train_step(b).unwrap_err();
    assert_eq!(
        err.downcast_ref::<Td3BonusError>(),
        Some(&Td3BonusError::EmptyBatch)
    );
    assert_eq!(before, network_params(&agent)?);

    // Failed steps do not advance the counter
    assert_eq!(agent.n_train_steps(), 0);
    assert!(agent.is_update_due());
    Ok(())
}

#[test]
fn test_actor_bonus_is_differentiable() -> Result<()> {
    let dir = TempDir::new("td3_bonus")?;
    let bonus_path = dir.path().join("bonus.safetensors");
    let obs = randn((BATCH_SIZE, DIM_OBS))?;
    let config = config_with::<Mlp>()
        .optimizer(OptimizerConfig::Sgd { lr: 0.0 })
        .policy_learning_rate(1e-2);

    let agent = Td3Mlp::build(config.clone().bonus_config(mlp_bonus_config()))?;
    agent.save_params(dir.path())?;
    agent.bonus().unwrap().varmap().save(&bonus_path)?;

    let mut agent_plain = Td3Mlp::build(
        config
            .clone()
            .bonus_config(mlp_bonus_config().model_path(bonus_path.clone())),
    )?;
    agent_plain.load_params(dir.path())?;
    let mut agent_bonus = Td3Mlp::build(
        config.bonus_config(
            mlp_bonus_config()
                .model_path(bonus_path.clone())
                .use_bonus_policy(true),
        ),
    )?;
    agent_bonus.load_params(dir.path())?;

    // Gradients of the objective reach the bonus network
    let grads = agent_bonus.actor_objective(&obs)?.policy_loss.backward()?;
    let bonus_vars = agent_bonus.bonus().unwrap().varmap().all_vars();
    assert!(!bonus_vars.is_empty());
    assert!(bonus_vars.iter().any(|v| grads.get(v.as_tensor()).is_some()));

    // and through the actions into the policy
    agent_plain.update_actor(&obs)?;
    agent_bonus.update_actor(&obs)?;
    assert_ne!(
        params(agent_plain.networks()[0].1)?,
        params(agent_bonus.networks()[0].1)?
    );
    Ok(())
}

#[test]
fn test_critic_bonus_is_detached() -> Result<()> {
    let agent =
        Td3Mlp::build(config_with::<Mlp>().bonus_config(mlp_bonus_config().use_bonus_critic(true)))?;
    let next_obs = randn((BATCH_SIZE, DIM_OBS))?;
    let rewards = Tensor::zeros((BATCH_SIZE,), DType::F32, &Device::Cpu)?;
    let terminals = Tensor::zeros((BATCH_SIZE,), DType::F32, &Device::Cpu)?;

    let target = agent.compute_target(&next_obs, &rewards, &terminals)?;
    let critic_bonus = target.critic_bonus.unwrap();
    let loss = (target.q_target.sum_all()? + critic_bonus.sum_all()?)?;
    let loss = (loss + target.min_target_q.sum_all()?)?;
    let grads = loss.backward()?;

    let evaluator = agent.bonus().unwrap();
    let bonus_vars = evaluator.varmap().all_vars();
    assert!(!bonus_vars.is_empty());
    assert!(bonus_vars.iter().all(|v| grads.get(v.as_tensor()).is_none()));
    for (name, varmap) in agent.networks() {
        for v in varmap.all_vars() {
            assert!(grads.get(v.as_tensor()).is_none(), "{}", name);
        }
    }

    // The bonus itself is differentiable
    let act = randn((BATCH_SIZE, DIM_ACT))?;
    let grads = evaluator.bonus(&next_obs, &act)?.sum_all()?.backward()?;
    assert!(bonus_vars.iter().any(|v| grads.get(v.as_tensor()).is_some()));
    Ok(())
}

#[test]
fn test_sgd_and_smooth_l1() -> Result<()> {
    let config = config()
        .tau(0.0)
        .optimizer(OptimizerConfig::Sgd { lr: 0.0 })
        .critic_loss(td3_bonus_agent::util::CriticLoss::SmoothL1);
    assert_eq!(config.actor_config.opt_config, OptimizerConfig::Sgd { lr: 1e-3 });

    let config = config.policy_learning_rate(0.0).qf_learning_rate(0.0);
    let mut agent = Td3::build(config)?;
    let before = network_params(&agent)?;
    agent.train_step(batch(vec![0; BATCH_SIZE])?)?;

    // Zero learning rate keeps every network
    assert_eq!(before, network_params(&agent)?);
    assert!(agent.diagnostics().get_scalar("qf1_loss")? >= 0.0);
    Ok(())
}

struct RandomReplayBuffer {
    n_opts: usize,
}

impl ReplayBufferBase for RandomReplayBuffer {
    type Config = ();
    type Batch = TensorTransitionBatch;

    fn build(_config: &Self::Config) -> Self {
        Self { n_opts: 0 }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        assert_eq!(size, BATCH_SIZE);
        self.n_opts += 1;
        batch(vec![0; size])
    }
}

#[test]
fn test_opt_with_replay_buffer() -> Result<()> {
    let mut agent = Td3::build(config())?;
    let mut buffer = RandomReplayBuffer::build(&());

    let record = agent.opt_with_record(&mut buffer)?;
    assert!(record.get_scalar("qf1_loss").is_ok());
    agent.opt(&mut buffer)?;
    assert_eq!(buffer.n_opts, 2);
    assert_eq!(agent.n_train_steps(), 2);
    Ok(())
}

#[test]
fn test_config_yaml() -> Result<()> {
    let dir = TempDir::new("td3_bonus")?;
    let path = dir.path().join("td3.yaml");
    let config = config().bonus_config(bonus_config(0.5).use_log(true));
    config.save(&path)?;

    let config_ = Td3Config::load(&path)?;
    assert_eq!(serde_yaml::to_string(&config)?, serde_yaml::to_string(&config_)?);
    assert_eq!(config_.target_policy_noise, 0.2);
    assert_eq!(config_.target_policy_noise_clip, 0.5);
    assert_eq!(config_.policy_and_target_update_period, 2);

    let agent = Td3::build_from_path(&path)?;
    assert_eq!(agent.n_train_steps(), 0);
    Ok(())
}
