use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train an agent from scratch against the simulator.
    Train {
        /// YAML file holding the training configuration.
        #[arg(short, long, default_value = "config/train_config.yaml")]
        config: PathBuf,
        /// Checkpoint to continue training from. Overrides `resume_from`.
        #[arg(short, long)]
        resume: Option<PathBuf>,
    },
    /// Fine-tune pretrained (behavioral cloning) weights with reinforcement
    /// learning.
    Hybrid {
        #[arg(short, long, default_value = "config/train_config.yaml")]
        config: PathBuf,
        /// Bare policy weights to start from.
        #[arg(short, long)]
        pretrained: PathBuf,
        /// Where the final model goes. Overrides `model_save_path`.
        #[arg(short, long)]
        output_model: Option<PathBuf>,
    },
    /// Play greedy episodes with a saved model and report its rewards.
    Evaluate {
        #[arg(short, long)]
        model: PathBuf,
        #[arg(short, long, default_value_t = 100)]
        episodes: u64,
        #[arg(long, default_value_t = 1000)]
        max_steps: u64,
        /// Simulator address; defaults to the local simulator port.
        #[arg(short, long)]
        simulator: Option<String>,
        /// Optional JSON file for the evaluation report.
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}
