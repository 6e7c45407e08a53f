use crate::config::TrainConfig;
use crate::env::{EnvError, Environment};
use learner::{Agent, AgentError, LoadOutcome};
use log::{error, info};
use model::CheckpointError;
use plot::{EpisodeRecord, TrainingLog};
use replay_data::Transition;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("environment failed: {0}")]
    Env(#[from] EnvError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("model file not found: {}", .0.display())]
    MissingModelFile(PathBuf),
    #[error("could not export metrics: {0}")]
    Metrics(#[source] io::Error),
}

/// Episode loop settings shared by plain and hybrid training.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingPlan {
    pub max_episodes: u64,
    pub max_steps_per_episode: u64,
    pub checkpoint_interval: u64,
    pub checkpoint_dir: PathBuf,
    pub checkpoint_prefix: &'static str,
    /// Leading episodes reported as warm-up of pretrained weights.
    pub warmup_episodes: u64,
    pub model_save_path: PathBuf,
    pub metrics_path: PathBuf,
}

impl TrainingPlan {
    pub fn new(config: &TrainConfig) -> Self {
        Self {
            max_episodes: config.max_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            checkpoint_interval: config.checkpoint_interval.max(1),
            checkpoint_dir: config.checkpoint_dir.clone(),
            checkpoint_prefix: "episode",
            warmup_episodes: 0,
            model_save_path: config.model_save_path.clone(),
            metrics_path: config.metrics_path.clone(),
        }
    }
    pub fn hybrid(config: &TrainConfig) -> Self {
        Self {
            checkpoint_prefix: "hybrid_episode",
            warmup_episodes: config.bc_warmup_episodes,
            ..Self::new(config)
        }
    }
    pub fn checkpoint_path(&self, episode: u64) -> PathBuf {
        self.checkpoint_dir
            .join(format!("{}_{episode}.ckpt", self.checkpoint_prefix))
    }
    /// Periodic saves only happen once warm-up is over.
    fn is_checkpoint_episode(&self, episode: u64) -> bool {
        episode >= self.warmup_episodes && episode % self.checkpoint_interval == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingSummary {
    pub episodes: u64,
    pub final_epsilon: f64,
    pub steps: u64,
    pub last_loss: Option<f32>,
}

/// Loads `path` into `agent` before training continues from it. Unlike a
/// plain [`Agent::load_checkpoint`], a missing file is an error here.
pub fn resume_agent(agent: &mut Agent, path: &Path) -> Result<LoadOutcome, TrainError> {
    match agent.load_checkpoint(path)? {
        LoadOutcome::NotFound => Err(TrainError::MissingModelFile(path.to_path_buf())),
        outcome => {
            info!(
                "resuming from {} at step {} with epsilon {:.4}",
                path.display(),
                agent.steps(),
                agent.epsilon()
            );
            Ok(outcome)
        }
    }
}

fn format_loss(loss: Option<f32>) -> String {
    loss.map_or_else(|| "none".to_string(), |loss| format!("{loss:.5}"))
}

pub struct Trainer<E> {
    agent: Agent,
    env: E,
    plan: TrainingPlan,
    log: TrainingLog,
}

impl<E: Environment> Trainer<E> {
    pub fn new(agent: Agent, env: E, plan: TrainingPlan) -> Self {
        Self {
            agent,
            env,
            plan,
            log: TrainingLog::new(),
        }
    }
    pub fn agent(&self) -> &Agent {
        &self.agent
    }
    pub fn log(&self) -> &TrainingLog {
        &self.log
    }
    pub fn into_parts(self) -> (Agent, E, TrainingLog) {
        (self.agent, self.env, self.log)
    }

    /// Plays one episode, learning from every step.
    pub fn run_episode(&mut self, episode: u64) -> Result<EpisodeRecord, TrainError> {
        let mut state = self.env.reset()?;
        let mut total_reward = 0.0;
        let mut last_loss = None;
        let mut steps = 0;
        while steps < self.plan.max_steps_per_episode {
            let action = self.agent.select_action(&state)?;
            let step = self.env.step(action);
            let outcome = self.agent.update(Transition {
                state,
                action,
                reward: step.reward,
                next_state: step.state,
                done: step.done,
            })?;
            if outcome.loss.is_some() {
                last_loss = outcome.loss;
            }
            total_reward += f64::from(step.reward);
            steps += 1;
            state = step.state;
            if step.done {
                if let Some(why) = step.info.error {
                    info!("episode {episode} ended early: {why}");
                }
                break;
            }
        }
        Ok(EpisodeRecord {
            episode,
            total_reward,
            epsilon: self.agent.epsilon(),
            loss: last_loss,
            steps,
            warmup: episode < self.plan.warmup_episodes,
        })
    }

    pub fn run(&mut self) -> Result<TrainingSummary, TrainError> {
        let mut last_loss = None;
        for episode in 0..self.plan.max_episodes {
            let record = self.run_episode(episode)?;
            let phase = if record.warmup { "Warm-up episode" } else { "Episode" };
            info!(
                "{phase} {episode}, Total Reward {}, Epsilon {:.4}, Loss {}",
                record.total_reward,
                record.epsilon,
                format_loss(record.loss)
            );
            if record.loss.is_some() {
                last_loss = record.loss;
            }
            self.log.log(record);
            if self.plan.is_checkpoint_episode(episode) {
                let path = self.plan.checkpoint_path(episode);
                if let Err(e) = self.agent.save_checkpoint(&path) {
                    error!("could not save checkpoint {}: {e}", path.display());
                }
            }
        }
        self.agent.save_checkpoint(&self.plan.model_save_path)?;
        self.log
            .export_json(&self.plan.metrics_path)
            .map_err(TrainError::Metrics)?;
        info!("metrics written to {}", self.plan.metrics_path.display());
        Ok(TrainingSummary {
            episodes: self.plan.max_episodes,
            final_epsilon: self.agent.epsilon(),
            steps: self.agent.steps(),
            last_loss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Step, StepInfo};
    use learner::AgentConfig;
    use replay_data::{Action, StateVector, STATE_SIZE};

    /// Scripted environment: every episode lasts `episode_len` steps, the
    /// last one terminal, and reward is 1 for `Up`.
    struct ScriptedEnv {
        episode_len: u64,
        t: u64,
        resets: u64,
        fail_reset_at: Option<u64>,
    }

    impl ScriptedEnv {
        fn new(episode_len: u64) -> Self {
            Self {
                episode_len,
                t: 0,
                resets: 0,
                fail_reset_at: None,
            }
        }
        fn observe(&self) -> StateVector {
            StateVector([self.t as f32 * 0.1; STATE_SIZE])
        }
    }

    impl Environment for ScriptedEnv {
        fn reset(&mut self) -> Result<StateVector, EnvError> {
            if self.fail_reset_at == Some(self.resets) {
                return Err(EnvError::NotConnected);
            }
            self.resets += 1;
            self.t = 0;
            Ok(self.observe())
        }
        fn step(&mut self, action: Action) -> Step {
            self.t += 1;
            Step {
                state: self.observe(),
                reward: if action == Action::Up { 1.0 } else { 0.0 },
                done: self.t >= self.episode_len,
                info: StepInfo::default(),
            }
        }
    }

    fn agent() -> Agent {
        Agent::with_seed(
            AgentConfig {
                learning_rate: 1e-3,
                buffer_size: 500,
                batch_size: 8,
                target_update_freq: 10,
                epsilon_decay: 0.99,
                ..Default::default()
            },
            11,
        )
        .unwrap()
    }

    fn plan(dir: &Path, max_episodes: u64, max_steps: u64) -> TrainingPlan {
        TrainingPlan {
            max_episodes,
            max_steps_per_episode: max_steps,
            checkpoint_interval: 2,
            checkpoint_dir: dir.join("checkpoints"),
            checkpoint_prefix: "episode",
            warmup_episodes: 0,
            model_save_path: dir.join("models/final.ckpt"),
            metrics_path: dir.join("metrics.json"),
        }
    }

    #[test_log::test]
    fn run_learns_checkpoints_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(agent(), ScriptedEnv::new(6), plan(dir.path(), 5, 100));
        let summary = trainer.run().unwrap();

        assert_eq!(summary.episodes, 5);
        assert_eq!(summary.steps, 30);
        assert!(summary.last_loss.is_some_and(f32::is_finite));
        assert!((summary.final_epsilon - 0.99f64.powi(30)).abs() < 1e-9);
        for episode in [0, 2, 4] {
            assert!(dir
                .path()
                .join(format!("checkpoints/episode_{episode}.ckpt"))
                .exists());
        }
        assert!(!dir.path().join("checkpoints/episode_1.ckpt").exists());
        assert!(dir.path().join("models/final.ckpt").exists());
        assert!(dir.path().join("metrics.json").exists());

        let log = trainer.log();
        assert_eq!(log.episodes().len(), 5);
        assert!(log.episodes().iter().all(|r| r.steps == 6));
        // the first episode has 6 transitions, fewer than a batch until step 8
        assert_eq!(log.episodes()[0].loss, None);
        assert!(log.episodes()[1].loss.is_some());
    }

    #[test]
    fn step_cap_ends_long_episodes() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(agent(), ScriptedEnv::new(1000), plan(dir.path(), 1, 25));
        let record = trainer.run_episode(0).unwrap();
        assert_eq!(record.steps, 25);
        assert_eq!(trainer.agent().steps(), 25);
    }

    #[test]
    fn reset_failure_aborts_training() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = ScriptedEnv::new(3);
        env.fail_reset_at = Some(2);
        let mut trainer = Trainer::new(agent(), env, plan(dir.path(), 5, 10));
        assert!(matches!(trainer.run(), Err(TrainError::Env(_))));
        assert_eq!(trainer.log().episodes().len(), 2);
        assert!(!dir.path().join("models/final.ckpt").exists());
    }

    #[test]
    fn resuming_needs_an_existing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut fresh = agent();
        assert!(matches!(
            resume_agent(&mut fresh, &dir.path().join("missing.ckpt")),
            Err(TrainError::MissingModelFile(_))
        ));

        let mut trainer = Trainer::new(agent(), ScriptedEnv::new(4), plan(dir.path(), 2, 10));
        trainer.run().unwrap();
        let (trained, _, _) = trainer.into_parts();
        assert_eq!(
            resume_agent(&mut fresh, &dir.path().join("models/final.ckpt")).unwrap(),
            LoadOutcome::Restored
        );
        assert_eq!(fresh.steps(), trained.steps());
        assert_eq!(fresh.epsilon(), trained.epsilon());
    }

    #[test]
    fn warmup_episodes_are_not_checkpointed() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TrainingPlan {
            checkpoint_prefix: "hybrid_episode",
            warmup_episodes: 3,
            ..plan(dir.path(), 5, 10)
        };
        let mut trainer = Trainer::new(agent(), ScriptedEnv::new(4), plan);
        trainer.run().unwrap();
        let saved = |episode: u64| {
            dir.path()
                .join(format!("checkpoints/hybrid_episode_{episode}.ckpt"))
                .exists()
        };
        assert!(!saved(0) && !saved(2));
        assert!(saved(4));
        let warmup: Vec<bool> = trainer.log().episodes().iter().map(|r| r.warmup).collect();
        assert_eq!(warmup, [true, true, true, false, false]);
    }

    #[test]
    fn hybrid_plan_labels_warmup_and_prefixes_checkpoints() {
        let config = TrainConfig {
            bc_warmup_episodes: 3,
            ..Default::default()
        };
        let plan = TrainingPlan::hybrid(&config);
        assert_eq!(
            plan.checkpoint_path(200),
            PathBuf::from("checkpoints/hybrid_episode_200.ckpt")
        );
        assert_eq!(plan.warmup_episodes, 3);
        assert_eq!(
            TrainingPlan::new(&config).checkpoint_path(0),
            PathBuf::from("checkpoints/episode_0.ckpt")
        );
    }
}
