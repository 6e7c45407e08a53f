use crate::env::{EnvError, Environment};
use file_io::{create_parent_dirs, write_atomically};
use log::info;
use model::traits::Actor;
use model::ModelError;
use replay_data::StateVector;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("environment failed: {0}")]
    Env(#[from] EnvError),
    #[error("policy failed: {0}")]
    Model(#[from] ModelError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rewards: Vec<f64>,
    pub steps: Vec<u64>,
    pub mean_reward: f64,
    pub std_reward: f64,
    pub max_reward: f64,
    pub min_reward: f64,
    pub mean_steps: f64,
    pub std_steps: f64,
}

/// Mean and population standard deviation; `(0, 0)` for no values.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

impl EvaluationReport {
    pub fn from_episodes(rewards: Vec<f64>, steps: Vec<u64>) -> Self {
        let (mean_reward, std_reward) = mean_std(&rewards);
        let step_values: Vec<f64> = steps.iter().map(|&s| s as f64).collect();
        let (mean_steps, std_steps) = mean_std(&step_values);
        let extreme = |pick: fn(f64, f64) -> f64| rewards.iter().copied().reduce(pick);
        Self {
            mean_reward,
            std_reward,
            max_reward: extreme(f64::max).unwrap_or_default(),
            min_reward: extreme(f64::min).unwrap_or_default(),
            mean_steps,
            std_steps,
            rewards,
            steps,
        }
    }
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        create_parent_dirs(path)?;
        write_atomically(path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, self).map_err(io::Error::from)
        })
    }
}

/// Plays one greedy episode; returns its total reward and length.
pub fn evaluate_episode<A, E>(actor: &A, env: &mut E, max_steps: u64) -> Result<(f64, u64), EvalError>
where
    A: Actor<StateVector>,
    E: Environment,
{
    let mut state = env.reset()?;
    let mut total_reward = 0.0;
    let mut steps = 0;
    while steps < max_steps {
        let step = env.step(actor.best_action(&state)?);
        total_reward += f64::from(step.reward);
        steps += 1;
        state = step.state;
        if step.done {
            break;
        }
    }
    Ok((total_reward, steps))
}

pub fn evaluate<A, E>(
    actor: &A,
    env: &mut E,
    episodes: u64,
    max_steps: u64,
) -> Result<EvaluationReport, EvalError>
where
    A: Actor<StateVector>,
    E: Environment,
{
    let mut rewards = Vec::new();
    let mut steps = Vec::new();
    for episode in 0..episodes {
        let (reward, length) = evaluate_episode(actor, env, max_steps)?;
        if episode % 10 == 0 {
            info!("evaluation episode {episode}: reward {reward:.2}, steps {length}");
        }
        rewards.push(reward);
        steps.push(length);
    }
    let report = EvaluationReport::from_episodes(rewards, steps);
    info!(
        "mean reward {:.2} ± {:.2}, mean steps {:.2} ± {:.2}, max reward {:.2}, min reward {:.2}",
        report.mean_reward,
        report.std_reward,
        report.mean_steps,
        report.std_steps,
        report.max_reward,
        report.min_reward
    );
    Ok(report)
}
