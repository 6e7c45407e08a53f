use crate::adam::{Adam, AdamConfig, AdamState};
use crate::traits::{Actor, BasicLearner, ParamFetcher, TargetNet};
use crate::{LearningStepInfo, ModelError, Params, QNetwork};
use candle_core::{Device, Tensor};
use candle_nn::Optimizer;
use replay_data::{Action, Batch, StateVector, STATE_SIZE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f64,
}

/// Policy network, target network and the optimizer driving the policy.
pub struct DqnModel {
    policy: QNetwork,
    target: QNetwork,
    optimizer: Adam,
    gamma: f64,
    device: Device,
}

impl DqnModel {
    pub fn new(config: DqnConfig) -> Result<Self, ModelError> {
        let device = Device::Cpu;
        let policy = QNetwork::new(&device)?;
        let target = QNetwork::from_params(&device, &policy.params()?)?;
        let optimizer = Adam::from_named_vars(
            policy.named_vars(),
            AdamConfig {
                lr: config.learning_rate,
                ..Default::default()
            },
        )?;
        Ok(Self {
            policy,
            target,
            optimizer,
            gamma: config.gamma,
            device,
        })
    }
    pub fn policy(&self) -> &QNetwork {
        &self.policy
    }
    pub fn target(&self) -> &QNetwork {
        &self.target
    }
    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }
    pub fn target_params(&self) -> Result<Params, ModelError> {
        self.target.params()
    }
    pub fn set_target_params(&mut self, params: &Params) -> Result<(), ModelError> {
        self.target.set_params(params)
    }
    pub fn optimizer_state(&self) -> Result<AdamState, ModelError> {
        self.optimizer.state()
    }
    pub fn set_optimizer_state(&mut self, state: &AdamState) -> Result<(), ModelError> {
        self.optimizer.load_state(state)
    }
    /// Loads the same weights into both networks.
    pub fn load_weights(&mut self, params: &Params) -> Result<(), ModelError> {
        self.policy.set_params(params)?;
        self.target.set_params(params)
    }

    fn states_tensor(&self, states: &[StateVector]) -> candle_core::Result<Tensor> {
        let flat: Vec<f32> = states.iter().flat_map(|s| s.0).collect();
        Tensor::from_vec(flat, (states.len(), STATE_SIZE), &self.device)
    }
}

impl BasicLearner<Batch> for DqnModel {
    /// One gradient step on `mean((Q(s,a) - (r + gamma * max Q_target(s') * (1 - done)))^2)`.
    fn train_batch(&mut self, batch: &Batch) -> Result<LearningStepInfo, ModelError> {
        let batch_len = batch.len();
        let states = self.states_tensor(&batch.states)?;
        let next_states = self.states_tensor(&batch.next_states)?;
        let actions: Vec<u32> = batch.actions.iter().map(|a| a.index() as u32).collect();
        let actions = Tensor::from_vec(actions, (batch_len, 1), &self.device)?;
        let rewards = Tensor::from_slice(&batch.rewards, batch_len, &self.device)?;
        let not_done: Vec<f32> = batch
            .dones
            .iter()
            .map(|&done| if done { 0.0 } else { 1.0 })
            .collect();
        let not_done = Tensor::from_vec(not_done, batch_len, &self.device)?;

        let q_taken = self
            .policy
            .forward(&states)?
            .gather(&actions, 1)?
            .squeeze(1)?;
        let next_q = self.target.forward(&next_states)?.max(1)?.detach();
        let targets = (rewards + ((next_q * not_done)? * self.gamma)?)?.detach();
        let loss = candle_nn::loss::mse(&q_taken, &targets)?;
        self.optimizer.backward_step(&loss)?;

        Ok(LearningStepInfo {
            loss: loss.to_scalar::<f32>()?,
            average_q_val: q_taken.mean_all()?.to_scalar::<f32>()?,
        })
    }
}

impl TargetNet for DqnModel {
    fn copy_control_to_target(&mut self) -> Result<(), ModelError> {
        let params = self.policy.params()?;
        self.target.set_params(&params)
    }
}

impl ParamFetcher for DqnModel {
    fn params(&self) -> Result<Params, ModelError> {
        self.policy.params()
    }
    fn set_params(&mut self, params: &Params) -> Result<(), ModelError> {
        self.policy.set_params(params)
    }
}

impl Actor<StateVector> for DqnModel {
    fn best_action(&self, state: &StateVector) -> Result<Action, ModelError> {
        self.policy.best_action(state)
    }
}
