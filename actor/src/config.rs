use learner::{AgentConfig, InvalidConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed training config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}

/// Training run settings, read from a flat YAML mapping. Every key is
/// optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    #[serde(flatten)]
    pub agent: AgentConfig,
    pub max_episodes: u64,
    pub max_steps_per_episode: u64,
    /// Episodes between periodic checkpoints, counted from episode 0.
    pub checkpoint_interval: u64,
    pub checkpoint_dir: PathBuf,
    pub model_save_path: PathBuf,
    pub metrics_path: PathBuf,
    pub simulator_addr: String,
    pub seed: u64,
    pub bc_warmup_episodes: u64,
    pub hybrid_lr: f64,
    pub hybrid_epsilon: f64,
    pub resume_from: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            max_episodes: 1000,
            max_steps_per_episode: 1000,
            checkpoint_interval: 100,
            checkpoint_dir: "checkpoints".into(),
            model_save_path: "models/dqn_model.ckpt".into(),
            metrics_path: "metrics/training.json".into(),
            simulator_addr: ports::simulator_addr().to_string(),
            seed: 42,
            bc_warmup_episodes: 50,
            hybrid_lr: 1e-5,
            hybrid_epsilon: 0.3,
            resume_from: None,
        }
    }
}

impl TrainConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: TrainConfig = if yaml.trim().is_empty() {
            TrainConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        self.agent.validate()?;
        if self.checkpoint_interval == 0 {
            return Err(InvalidConfig(
                "checkpoint_interval must be at least 1".to_string(),
            ));
        }
        if self.max_steps_per_episode == 0 {
            return Err(InvalidConfig(
                "max_steps_per_episode must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.hybrid_epsilon) {
            return Err(InvalidConfig(format!(
                "hybrid_epsilon must lie in [0, 1], got {}",
                self.hybrid_epsilon
            )));
        }
        if !(self.hybrid_lr > 0.0 && self.hybrid_lr.is_finite()) {
            return Err(InvalidConfig(format!(
                "hybrid_lr must be positive, got {}",
                self.hybrid_lr
            )));
        }
        Ok(())
    }
    /// Agent settings for fine-tuning pretrained weights: lower learning rate
    /// and a lower starting exploration rate.
    pub fn hybrid_agent_config(&self) -> AgentConfig {
        AgentConfig {
            learning_rate: self.hybrid_lr,
            epsilon_start: self.hybrid_epsilon,
            epsilon_end: self.agent.epsilon_end.min(self.hybrid_epsilon),
            ..self.agent.clone()
        }
    }
}
