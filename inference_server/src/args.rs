use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Saved model to serve, either a full checkpoint or bare weights.
    #[arg(short, long, default_value = "models/dqn_model.ckpt")]
    pub model: PathBuf,
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(short, long, default_value_t = ports::INFERENCE)]
    pub port: u16,
    /// Seconds a client may stay silent before it is disconnected; 0 disables
    /// the timeout.
    #[arg(long, default_value_t = 30)]
    pub read_timeout_secs: u64,
}
