use thiserror::Error;

/// A frame that parsed as a line but not as a message we understand.
///
/// The `Display` text of each variant is what gets sent back to inference
/// clients inside `{"error": ...}`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Unknown message type")]
    UnknownMessage,
    #[error("Invalid state size")]
    InvalidStateSize,
    #[error("Message too large")]
    MessageTooLarge,
    #[error("{0}")]
    InvalidShape(String),
    #[error("unexpected {0} message")]
    UnexpectedMessage(&'static str),
}
