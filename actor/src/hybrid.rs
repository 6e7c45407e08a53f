use crate::config::TrainConfig;
use crate::training::TrainError;
use learner::Agent;
use log::info;
use model::{read_saved_model, CheckpointError, Params};
use std::path::Path;

/// Reads pretrained policy weights. A full checkpoint is accepted too; only
/// its policy network is used.
pub fn load_pretrained_weights(path: &Path) -> Result<Params, TrainError> {
    match read_saved_model(path) {
        Ok(saved) => Ok(saved.into_policy_params()),
        Err(CheckpointError::NotFound(path)) => Err(TrainError::MissingModelFile(path)),
        Err(e) => Err(e.into()),
    }
}

/// Agent for fine-tuning `pretrained` weights with reinforcement learning.
pub fn hybrid_agent(config: &TrainConfig, pretrained: &Params) -> Result<Agent, TrainError> {
    let agent_config = config.hybrid_agent_config();
    let mut agent = Agent::with_seed(agent_config, config.seed)?;
    agent.load_pretrained(pretrained)?;
    info!(
        "agent initialised from pretrained weights, learning rate {}, epsilon {}",
        config.hybrid_lr, config.hybrid_epsilon
    );
    Ok(agent)
}
