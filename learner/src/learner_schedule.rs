use crate::AgentConfig;
use serde::{Deserialize, Serialize};

/// Counts update calls and tracks the exploration rate they drive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnerSchedule {
    n_step: u64,
    eps: f64,
    eps_end: f64,
    eps_decay: f64,
    target_update_interval_steps: u64,
}

impl LearnerSchedule {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            n_step: 0,
            eps: config.epsilon_start,
            eps_end: config.epsilon_end,
            eps_decay: config.epsilon_decay,
            target_update_interval_steps: config.target_update_freq.max(1),
        }
    }
    pub fn eps(&self) -> f64 {
        self.eps
    }
    pub fn n_step(&self) -> u64 {
        self.n_step
    }
    /// Advances one update call and decays epsilon, never below its floor.
    pub fn step(&mut self) {
        self.n_step += 1;
        self.eps = self.eps_end.max(self.eps * self.eps_decay);
    }
    pub fn is_time_to_update_target(&self) -> bool {
        self.n_step % self.target_update_interval_steps == 0
    }
    /// Resumes from values read out of a checkpoint.
    pub fn restore(&mut self, eps: f64, n_step: u64) {
        self.eps = eps;
        self.n_step = n_step;
    }
}
