mod action;
mod state;
mod transition;

pub use action::Action;
pub use state::{InvalidStateSize, StateVector, STATE_SIZE};
pub use transition::{Batch, Transition};
