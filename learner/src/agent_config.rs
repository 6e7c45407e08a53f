use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid agent config: {0}")]
pub struct InvalidConfig(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f64,
    pub buffer_size: usize,
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    pub epsilon_decay: f64,
    pub target_update_freq: u64,
    pub batch_size: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            buffer_size: 100_000,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_decay: 0.995,
            target_update_freq: 1000,
            batch_size: 64,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let fail = |msg: String| Err(InvalidConfig(msg));
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if self.buffer_size == 0 {
            return fail("buffer_size must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return fail(format!("gamma must lie in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon_end) || !(0.0..=1.0).contains(&self.epsilon_start) {
            return fail("epsilon_start and epsilon_end must lie in [0, 1]".to_string());
        }
        if self.epsilon_end > self.epsilon_start {
            return fail(format!(
                "epsilon_end {} exceeds epsilon_start {}",
                self.epsilon_end, self.epsilon_start
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return fail(format!(
                "epsilon_decay must lie in (0, 1], got {}",
                self.epsilon_decay
            ));
        }
        if self.target_update_freq == 0 {
            return fail("target_update_freq must be at least 1".to_string());
        }
        Ok(())
    }
}
