//! Training metrics kept in memory and exported as JSON.
//!
//! Nothing here draws anything. External tools read the exported file and
//! decide for themselves how to chart it.

mod plot;
mod training_log;

pub use plot::Plot;
pub use training_log::{EpisodeRecord, TrainingLog};
