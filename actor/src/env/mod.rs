mod message_bridge;

use log::{debug, warn};
pub use message_bridge::MessageBridge;
use packets::{GameState, ProtocolError, Scores};
use replay_data::{Action, StateVector};
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tcp_io::FrameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("could not connect to simulator at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("simulator link failed: {0}")]
    Transport(#[from] FrameError),
    #[error("simulator sent a bad frame: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("not connected to the simulator")]
    NotConnected,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepInfo {
    /// Why the step ended the episode, when it failed.
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub state: StateVector,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

pub trait Environment {
    /// Starts a new episode. Failing here is fatal for the caller.
    fn reset(&mut self) -> Result<StateVector, EnvError>;
    /// Never fails: a broken link ends the episode instead.
    fn step(&mut self, action: Action) -> Step;
}

/// The game simulator, reached over TCP.
pub struct PongEnv {
    addr: String,
    read_timeout: Option<Duration>,
    bridge: Option<MessageBridge>,
    last_scores: Scores,
}

impl PongEnv {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            read_timeout: None,
            bridge: None,
            last_scores: Scores::default(),
        }
    }
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
    pub fn is_connected(&self) -> bool {
        self.bridge.is_some()
    }
    fn try_step(&mut self, action: Action) -> Result<(StateVector, f32), EnvError> {
        let bridge = self.bridge.as_mut().ok_or(EnvError::NotConnected)?;
        bridge.send_action(action, unix_timestamp())?;
        let game = bridge.recv_state()?;
        let reward = self.score_reward(game.scores);
        Ok((StateVector::from(&game), reward))
    }
    /// Player gains minus bot gains since the previous state.
    fn score_reward(&mut self, scores: Scores) -> f32 {
        let player_delta = scores.player - self.last_scores.player;
        let bot_delta = scores.bot - self.last_scores.bot;
        if player_delta < 0 || bot_delta < 0 {
            warn!(
                "scores went backwards ({:?} -> {:?}); the simulator probably reset mid-episode",
                self.last_scores, scores
            );
        }
        self.last_scores = scores;
        (player_delta - bot_delta) as f32
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

impl Environment for PongEnv {
    fn reset(&mut self) -> Result<StateVector, EnvError> {
        self.bridge = None;
        let mut bridge = MessageBridge::connect(&self.addr, self.read_timeout)?;
        let game = bridge.recv_state()?;
        debug!("connected to simulator at {}", self.addr);
        self.last_scores = game.scores;
        self.bridge = Some(bridge);
        Ok(StateVector::from(&game))
    }

    fn step(&mut self, action: Action) -> Step {
        match self.try_step(action) {
            Ok((state, reward)) => Step {
                state,
                reward,
                done: false,
                info: StepInfo::default(),
            },
            Err(e) => {
                warn!("step failed, ending episode: {e}");
                self.bridge = None;
                Step {
                    state: StateVector::from(&GameState::fallback()),
                    reward: 0.0,
                    done: true,
                    info: StepInfo {
                        error: Some(e.to_string()),
                    },
                }
            }
        }
    }
}
