//! JSON messages exchanged with the game simulator and with inference clients.

mod error;
mod inference;
mod simulator;

pub use error::ProtocolError;
pub use inference::{InferenceReply, InferenceRequest};
pub use simulator::{
    ActionCommand, ActiveEffect, Ball, GameState, Paddle, PowerUp, Scores, SimulatorMessage,
};
