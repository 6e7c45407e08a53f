use crate::{AgentConfig, InvalidConfig, LearnerSchedule};
use log::{debug, info, warn};
use model::traits::{Actor, BasicLearner, ParamFetcher, TargetNet};
use model::{
    read_saved_model, save_checkpoint, Checkpoint, CheckpointError, DqnConfig, DqnModel,
    ModelError, Params, SavedModel,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use replay_data::{Action, StateVector, Transition};
use replay_memories::ReplayQueue;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfig),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// What a single [`Agent::update`] call did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateOutcome {
    /// `None` while the replay queue holds fewer than `batch_size` transitions.
    pub loss: Option<f32>,
    pub epsilon: f64,
    pub steps: u64,
    pub target_synced: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    NotFound,
    Restored,
    WeightsOnly,
}

/// Epsilon-greedy DQN agent with its own replay queue.
pub struct Agent {
    model: DqnModel,
    replay: ReplayQueue,
    schedule: LearnerSchedule,
    config: AgentConfig,
    rng: StdRng,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        Self::with_rng(config, StdRng::from_entropy())
    }
    /// Seeds exploration and replay sampling. Initial network weights are
    /// still drawn from the tensor backend's own generator.
    pub fn with_seed(config: AgentConfig, seed: u64) -> Result<Self, AgentError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
    fn with_rng(config: AgentConfig, mut rng: StdRng) -> Result<Self, AgentError> {
        config.validate()?;
        let model = DqnModel::new(DqnConfig {
            learning_rate: config.learning_rate,
            gamma: config.gamma,
        })?;
        let replay = ReplayQueue::with_max_size_and_seed(config.buffer_size, rng.gen());
        Ok(Self {
            model,
            replay,
            schedule: LearnerSchedule::new(&config),
            config,
            rng,
        })
    }
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
    pub fn epsilon(&self) -> f64 {
        self.schedule.eps()
    }
    pub fn steps(&self) -> u64 {
        self.schedule.n_step()
    }
    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }
    pub fn model(&self) -> &DqnModel {
        &self.model
    }

    pub fn select_action(&mut self, state: &StateVector) -> Result<Action, AgentError> {
        if self.rng.gen::<f64>() < self.schedule.eps() {
            return Ok(Action::ALL[self.rng.gen_range(0..Action::COUNT)]);
        }
        self.greedy_action(state)
    }
    pub fn greedy_action(&self, state: &StateVector) -> Result<Action, AgentError> {
        Ok(self.model.best_action(state)?)
    }

    /// Stores the transition, learns from a sampled batch once enough
    /// transitions are stored, then advances the schedule.
    pub fn update(&mut self, transition: Transition) -> Result<UpdateOutcome, AgentError> {
        self.replay.add_transition(transition);
        let learned = self
            .replay
            .sample_batch(self.config.batch_size)
            .ok()
            .map(|batch| self.model.train_batch(&batch));
        // the step counts even if learning failed, so it matches the store
        self.schedule.step();
        let loss = match learned {
            Some(info) => {
                let info = info?;
                debug!(
                    "learning step: loss {:.5}, average q {:.4}",
                    info.loss, info.average_q_val
                );
                Some(info.loss)
            }
            None => None,
        };
        let target_synced = self.schedule.is_time_to_update_target();
        if target_synced {
            self.model.copy_control_to_target()?;
            debug!("target network synced at step {}", self.schedule.n_step());
        }
        Ok(UpdateOutcome {
            loss,
            epsilon: self.schedule.eps(),
            steps: self.schedule.n_step(),
            target_synced,
        })
    }

    pub fn checkpoint(&self) -> Result<Checkpoint, AgentError> {
        Ok(Checkpoint {
            policy_net: self.model.params()?,
            target_net: self.model.target_params()?,
            optimizer: self.model.optimizer_state()?,
            epsilon: self.schedule.eps(),
            steps: self.schedule.n_step(),
        })
    }
    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), AgentError> {
        let path = path.as_ref();
        save_checkpoint(path, &self.checkpoint()?)?;
        info!("checkpoint saved to {}", path.display());
        Ok(())
    }
    /// A missing file leaves the agent untouched and is reported, not failed.
    pub fn load_checkpoint<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadOutcome, AgentError> {
        let path = path.as_ref();
        let saved = match read_saved_model(path) {
            Ok(saved) => saved,
            Err(CheckpointError::NotFound(_)) => {
                warn!("checkpoint file {} not found", path.display());
                return Ok(LoadOutcome::NotFound);
            }
            Err(e) => return Err(e.into()),
        };
        let outcome = match saved {
            SavedModel::Full(checkpoint) => {
                self.restore(&checkpoint)?;
                LoadOutcome::Restored
            }
            SavedModel::PolicyOnly(params) => {
                self.model.load_weights(&params)?;
                LoadOutcome::WeightsOnly
            }
        };
        info!("checkpoint loaded from {} ({outcome:?})", path.display());
        Ok(outcome)
    }
    fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), AgentError> {
        self.model.set_params(&checkpoint.policy_net)?;
        self.model.set_target_params(&checkpoint.target_net)?;
        self.model.set_optimizer_state(&checkpoint.optimizer)?;
        self.schedule.restore(checkpoint.epsilon, checkpoint.steps);
        Ok(())
    }
    /// Starts both networks from externally trained weights.
    pub fn load_pretrained(&mut self, params: &Params) -> Result<(), AgentError> {
        self.model.load_weights(params)?;
        Ok(())
    }
}
