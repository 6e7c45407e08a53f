use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),
    #[error("parameter {0} is missing")]
    MissingParam(String),
    #[error("unexpected parameter {0}")]
    UnexpectedParam(String),
    #[error("parameter {name} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("no model file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not access model file: {0}")]
    Io(#[from] io::Error),
    #[error("{} holds neither a checkpoint nor model weights", .0.display())]
    Corrupt(PathBuf),
    #[error("model file does not fit the network: {0}")]
    Model(#[from] ModelError),
}
