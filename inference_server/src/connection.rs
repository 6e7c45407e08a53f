use log::{debug, error};
use model::traits::Actor;
use model::QNetwork;
use packets::{InferenceReply, InferenceRequest, ProtocolError};
use std::net::TcpStream;
use std::time::Duration;
use tcp_io::{write_frame, FrameError, FrameReader};

/// Reply for one request line, or `None` for a blank line.
pub fn respond(policy: &QNetwork, line: &str) -> Option<InferenceReply> {
    if line.trim().is_empty() {
        return None;
    }
    let reply = match InferenceRequest::decode(line) {
        Ok(InferenceRequest::Infer { state }) => match policy.best_action(&state) {
            Ok(action) => InferenceReply::from(action),
            Err(e) => {
                error!("forward pass failed: {e}");
                InferenceReply::Error {
                    error: format!("inference failed: {e}"),
                }
            }
        },
        Ok(InferenceRequest::Ping { .. }) => InferenceReply::Pong { pong: true },
        Err(e) => {
            debug!("rejected request {line:?}: {e}");
            InferenceReply::from(&e)
        }
    };
    Some(reply)
}

/// Answers requests in arrival order until the client hangs up. Returns the
/// number of replies sent.
pub fn serve_connection(
    policy: &QNetwork,
    stream: TcpStream,
    read_timeout: Option<Duration>,
) -> Result<u64, FrameError> {
    stream.set_nodelay(true)?;
    stream.set_read_timeout(read_timeout)?;
    let mut writer = stream.try_clone()?;
    let mut reader = FrameReader::new(stream);
    let mut replies = 0;
    loop {
        let reply = match reader.read_frame() {
            Ok(Some(frame)) => respond(policy, &frame),
            Ok(None) => return Ok(replies),
            // the bad frame is already consumed, so the stream stays in sync
            Err(FrameError::InvalidUtf8(_)) => {
                Some(InferenceReply::from(&ProtocolError::InvalidJson))
            }
            // the reader skips the rest of the line before the next read
            Err(FrameError::FrameTooLarge) => {
                debug!("rejected a frame over {} bytes", tcp_io::MAX_FRAME_LEN);
                Some(InferenceReply::from(&ProtocolError::MessageTooLarge))
            }
            Err(e) => return Err(e),
        };
        if let Some(reply) = reply {
            write_frame(&mut writer, &reply)?;
            replies += 1;
        }
    }
}
