//! Serves greedy actions from a trained value network over newline-delimited
//! JSON.

mod connection;
mod server;

pub use connection::{respond, serve_connection};
pub use server::{InferenceServer, ServerConfig, ServerError, ShutdownHandle};
