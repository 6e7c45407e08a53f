use crate::ProtocolError;
use replay_data::{Action, StateVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Ball {
    /// Stand-in used whenever the simulator reports no ball in play.
    pub const CENTERED: Ball = Ball {
        x: 400.0,
        y: 300.0,
        vx: 0.0,
        vy: 0.0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub player: i64,
    pub bot: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    #[serde(rename = "type")]
    pub kind: u8,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    #[serde(rename = "type")]
    pub kind: u8,
    pub time_left: f32,
}

/// Snapshot of the game pushed by the simulator after every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub balls: Vec<Ball>,
    pub player_paddle: Paddle,
    pub bot_paddle: Paddle,
    pub scores: Scores,
    #[serde(default)]
    pub power_ups: Vec<PowerUp>,
    #[serde(default)]
    pub active_effects: Vec<ActiveEffect>,
}

impl GameState {
    /// State reported to the training loop when the simulator link breaks.
    pub fn fallback() -> Self {
        Self {
            balls: vec![Ball::CENTERED],
            player_paddle: Paddle {
                x: 50.0,
                y: 250.0,
                width: 20.0,
                height: 100.0,
            },
            bot_paddle: Paddle {
                x: 730.0,
                y: 250.0,
                width: 20.0,
                height: 100.0,
            },
            scores: Scores::default(),
            power_ups: vec![],
            active_effects: vec![],
        }
    }
    /// The ball the agent observes: the first one, or [`Ball::CENTERED`].
    pub fn tracked_ball(&self) -> Ball {
        self.balls.first().copied().unwrap_or(Ball::CENTERED)
    }
}

impl From<&GameState> for StateVector {
    fn from(game: &GameState) -> Self {
        let ball = game.tracked_ball();
        let player = game.player_paddle;
        let bot = game.bot_paddle;
        StateVector([
            ball.x,
            ball.y,
            ball.vx,
            ball.vy,
            player.x,
            player.y,
            player.width,
            player.height,
            bot.x,
            bot.y,
            bot.width,
            bot.height,
            game.scores.player as f32,
            game.scores.bot as f32,
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    /// Paddle direction, `-1`, `0` or `1`.
    pub action: i8,
    pub timestamp: f64,
}

impl ActionCommand {
    pub fn new(action: Action, timestamp: f64) -> Self {
        Self {
            action: action.paddle_direction(),
            timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SimulatorMessage {
    State(GameState),
    Action(ActionCommand),
}

impl SimulatorMessage {
    /// Decodes one frame.
    ///
    /// The game binary pushes states as `{"data": {...}}` with no `type`
    /// field, so an untagged object carrying `data` is read as a state.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame).map_err(|_| ProtocolError::InvalidJson)?;
        match value {
            Value::Object(mut fields) if !fields.contains_key("type") => {
                let data = fields.remove("data").ok_or(ProtocolError::UnknownMessage)?;
                serde_json::from_value(data)
                    .map(SimulatorMessage::State)
                    .map_err(|e| ProtocolError::InvalidShape(e.to_string()))
            }
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| ProtocolError::InvalidShape(e.to_string())),
            _ => Err(ProtocolError::UnknownMessage),
        }
    }
    pub fn into_state(self) -> Result<GameState, ProtocolError> {
        match self {
            SimulatorMessage::State(state) => Ok(state),
            SimulatorMessage::Action(_) => Err(ProtocolError::UnexpectedMessage("action")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const STATE_DATA: &str = r#"{
        "balls": [{"x": 120.5, "y": 80, "vx": -3, "vy": 2.25}, {"x": 1, "y": 1, "vx": 1, "vy": 1}],
        "player_paddle": {"x": 50, "y": 240, "width": 20, "height": 100},
        "bot_paddle": {"x": 730, "y": 260, "width": 20, "height": 120},
        "scores": {"player": 3, "bot": 5},
        "power_ups": [{"type": 1, "x": 300, "y": 200}],
        "active_effects": [{"type": 2, "time_left": 4.5}]
    }"#;

    fn frame(prefix: &str) -> String {
        format!("{{{prefix}\"data\": {STATE_DATA}}}").replace('\n', "")
    }

    #[rstest]
    #[case("\"type\": \"state\", ")]
    #[case("")]
    fn state_frames_decode_with_or_without_tag(#[case] prefix: &str) {
        let state = SimulatorMessage::decode(&frame(prefix))
            .unwrap()
            .into_state()
            .unwrap();
        assert_eq!(state.balls.len(), 2);
        assert_eq!(state.scores, Scores { player: 3, bot: 5 });
        assert_eq!(state.power_ups[0].kind, 1);
        assert_eq!(state.active_effects[0].time_left, 4.5);
    }

    #[test]
    fn flattening_uses_first_ball_then_paddles_then_scores() {
        let state = SimulatorMessage::decode(&frame(""))
            .unwrap()
            .into_state()
            .unwrap();
        assert_eq!(
            StateVector::from(&state).0,
            [
                120.5, 80.0, -3.0, 2.25, 50.0, 240.0, 20.0, 100.0, 730.0, 260.0, 20.0, 120.0, 3.0,
                5.0
            ]
        );
    }

    #[test]
    fn missing_ball_is_replaced_by_centered_ball() {
        let mut state = GameState::fallback();
        state.balls.clear();
        let vector = StateVector::from(&state);
        assert_eq!(&vector.0[..4], &[400.0, 300.0, 0.0, 0.0]);
        assert_eq!(vector, StateVector::from(&GameState::fallback()));
    }

    #[test]
    fn power_ups_and_effects_are_optional() {
        let line = r#"{"data":{"balls":[],"player_paddle":{"x":0,"y":0,"width":1,"height":1},"bot_paddle":{"x":0,"y":0,"width":1,"height":1},"scores":{"player":0,"bot":0}}}"#;
        let state = SimulatorMessage::decode(line).unwrap().into_state().unwrap();
        assert!(state.power_ups.is_empty());
        assert!(state.active_effects.is_empty());
    }

    #[test]
    fn action_command_encodes_as_tagged_frame() {
        let message = SimulatorMessage::Action(ActionCommand::new(Action::Down, 12.5));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "action", "data": {"action": -1, "timestamp": 12.5}})
        );
        assert_eq!(
            SimulatorMessage::decode(&json.to_string()).unwrap(),
            message
        );
        assert_eq!(
            message.into_state(),
            Err(ProtocolError::UnexpectedMessage("action"))
        );
    }

    #[rstest]
    #[case("not json", ProtocolError::InvalidJson)]
    #[case("[1, 2]", ProtocolError::UnknownMessage)]
    #[case("{\"scores\": {}}", ProtocolError::UnknownMessage)]
    fn malformed_frames_are_rejected(#[case] line: &str, #[case] expected: ProtocolError) {
        assert_eq!(SimulatorMessage::decode(line), Err(expected));
    }

    #[rstest]
    #[case("{\"data\": {\"balls\": []}}")]
    #[case("{\"type\": \"reset\", \"data\": {}}")]
    fn wrong_shapes_are_protocol_errors(#[case] line: &str) {
        assert!(matches!(
            SimulatorMessage::decode(line),
            Err(ProtocolError::InvalidShape(_))
        ));
    }
}
