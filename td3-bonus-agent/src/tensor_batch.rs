use candle_core::Tensor;
use td3_bonus_core::TransitionBatch;

/// A batch of transitions held in candle tensors.
///
/// `obs` and `next_obs` are `[batch_size, obs_dim]` and `act` is
/// `[batch_size, act_dim]`.
#[derive(Clone, Debug)]
pub struct TensorTransitionBatch {
    obs: Tensor,
    act: Tensor,
    next_obs: Tensor,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
}

impl TensorTransitionBatch {
    /// Creates a batch.
    ///
    /// Consistency of the batch dimension and the terminal flags is checked
    /// when the batch is consumed by the agent.
    pub fn new(
        obs: Tensor,
        act: Tensor,
        next_obs: Tensor,
        reward: Vec<f32>,
        is_terminated: Vec<i8>,
    ) -> Self {
        Self {
            obs,
            act,
            next_obs,
            reward,
            is_terminated,
        }
    }
}

impl TransitionBatch for TensorTransitionBatch {
    type ObsBatch = Tensor;
    type ActBatch = Tensor;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }
}
