mod args;

use actor::config::TrainConfig;
use actor::env::PongEnv;
use actor::evaluation::evaluate;
use actor::hybrid::{hybrid_agent, load_pretrained_weights};
use actor::training::{resume_agent, Trainer, TrainingPlan, TrainingSummary};
use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use learner::Agent;
use log::info;
use std::path::{Path, PathBuf};

// Training runs for hours and keeps a large replay buffer of small
// allocations; jemalloc keeps the heap from fragmenting over that time.
#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn load_config(path: &Path) -> anyhow::Result<TrainConfig> {
    let config = TrainConfig::from_yaml_file(path)
        .with_context(|| format!("loading training config {}", path.display()))?;
    info!("loaded training config from {}", path.display());
    Ok(config)
}

fn report_summary(summary: &TrainingSummary) {
    info!(
        "training finished: {} episodes, {} steps, final epsilon {:.4}, last loss {}",
        summary.episodes,
        summary.steps,
        summary.final_epsilon,
        summary
            .last_loss
            .map_or_else(|| "none".to_string(), |loss| format!("{loss:.5}"))
    );
}

fn train(config_path: &Path, resume: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if resume.is_some() {
        config.resume_from = resume;
    }
    let mut agent =
        Agent::with_seed(config.agent.clone(), config.seed).context("creating agent")?;
    if let Some(path) = &config.resume_from {
        resume_agent(&mut agent, path).context("resuming training")?;
    }
    let env = PongEnv::new(config.simulator_addr.clone());
    let mut trainer = Trainer::new(agent, env, TrainingPlan::new(&config));
    let summary = trainer.run().context("training")?;
    report_summary(&summary);
    info!("model saved to {}", config.model_save_path.display());
    Ok(())
}

fn hybrid(
    config_path: &Path,
    pretrained: &Path,
    output_model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(path) = output_model {
        config.model_save_path = path;
    }
    let weights = load_pretrained_weights(pretrained)
        .with_context(|| format!("loading pretrained weights {}", pretrained.display()))?;
    let agent = hybrid_agent(&config, &weights).context("creating hybrid agent")?;
    let env = PongEnv::new(config.simulator_addr.clone());
    let mut trainer = Trainer::new(agent, env, TrainingPlan::hybrid(&config));
    let summary = trainer.run().context("hybrid training")?;
    report_summary(&summary);
    info!("hybrid model saved to {}", config.model_save_path.display());
    Ok(())
}

fn evaluate_model(
    model_path: &Path,
    episodes: u64,
    max_steps: u64,
    simulator: Option<String>,
    report_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let policy = model::load_policy(model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;
    info!("loaded model from {}", model_path.display());
    let addr = simulator.unwrap_or_else(|| ports::simulator_addr().to_string());
    let mut env = PongEnv::new(addr);
    let report = evaluate(&policy, &mut env, episodes, max_steps).context("evaluation")?;
    if let Some(path) = report_path {
        report
            .export_json(&path)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!("report written to {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.command {
        Command::Train { config, resume } => train(&config, resume),
        Command::Hybrid {
            config,
            pretrained,
            output_model,
        } => hybrid(&config, &pretrained, output_model),
        Command::Evaluate {
            model,
            episodes,
            max_steps,
            simulator,
            report,
        } => evaluate_model(&model, episodes, max_steps, simulator, report),
    }
}
