use crate::Plot;
use file_io::{create_parent_dirs, write_atomically};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

const EPISODES_PER_REWARD_POINT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: u64,
    pub total_reward: f64,
    pub epsilon: f64,
    /// Loss of the last learning step in the episode, if any ran.
    pub loss: Option<f32>,
    pub steps: u64,
    #[serde(default)]
    pub warmup: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    episodes: Vec<EpisodeRecord>,
    losses: Vec<f32>,
    reward_trend: Plot,
}

impl Default for TrainingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingLog {
    pub fn new() -> Self {
        Self {
            episodes: vec![],
            losses: vec![],
            reward_trend: Plot::new(EPISODES_PER_REWARD_POINT),
        }
    }
    pub fn log(&mut self, record: EpisodeRecord) {
        if let Some(loss) = record.loss {
            self.losses.push(loss);
        }
        self.reward_trend
            .add_datum((record.episode as f64, record.total_reward));
        self.episodes.push(record);
    }
    pub fn episodes(&self) -> &[EpisodeRecord] {
        &self.episodes
    }
    /// Losses of the episodes that had one, in episode order.
    pub fn losses(&self) -> &[f32] {
        &self.losses
    }
    pub fn reward_trend(&self) -> &Plot {
        &self.reward_trend
    }
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        create_parent_dirs(path)?;
        write_atomically(path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, self).map_err(io::Error::from)
        })
    }
}
