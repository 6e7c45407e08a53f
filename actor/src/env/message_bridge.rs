use super::EnvError;
use log::trace;
use packets::{ActionCommand, GameState, SimulatorMessage};
use replay_data::Action;
use std::net::TcpStream;
use std::time::Duration;
use tcp_io::{write_frame, FrameError, FrameReader};

/// One live connection to the simulator.
pub struct MessageBridge {
    reader: FrameReader<TcpStream>,
    writer: TcpStream,
}

impl MessageBridge {
    pub fn connect(addr: &str, read_timeout: Option<Duration>) -> Result<Self, EnvError> {
        let stream = TcpStream::connect(addr).map_err(|source| EnvError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        stream.set_nodelay(true).map_err(FrameError::from)?;
        stream
            .set_read_timeout(read_timeout)
            .map_err(FrameError::from)?;
        let writer = stream.try_clone().map_err(FrameError::from)?;
        Ok(Self {
            reader: FrameReader::new(stream),
            writer,
        })
    }
    pub fn send_action(&mut self, action: Action, timestamp: f64) -> Result<(), FrameError> {
        let message = SimulatorMessage::Action(ActionCommand::new(action, timestamp));
        write_frame(&mut self.writer, &message)
    }
    /// Waits for the next state push. Blank lines are skipped.
    pub fn recv_state(&mut self) -> Result<GameState, EnvError> {
        loop {
            let frame = self
                .reader
                .read_frame()?
                .ok_or(FrameError::ConnectionLost)?;
            if frame.trim().is_empty() {
                continue;
            }
            trace!("simulator frame: {frame}");
            return Ok(SimulatorMessage::decode(&frame)?.into_state()?);
        }
    }
}
