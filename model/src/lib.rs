mod adam;
mod checkpoint;
mod dqn_model;
mod error;
mod params;
mod q_network;
pub mod traits;

pub use adam::{Adam, AdamConfig, AdamState};
pub use checkpoint::{
    load_policy, read_saved_model, save_checkpoint, save_params, Checkpoint, SavedModel,
};
pub use dqn_model::{DqnConfig, DqnModel};
pub use error::{CheckpointError, ModelError};
pub use params::{NamedTensor, Params};
pub use q_network::QNetwork;

/// Width of both hidden layers of the value network.
pub const HIDDEN_SIZE: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LearningStepInfo {
    pub loss: f32,
    pub average_q_val: f32,
}
