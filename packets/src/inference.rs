use crate::ProtocolError;
use replay_data::{Action, StateVector, STATE_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request sent by an inference client, one per line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InferenceRequest {
    Infer { state: StateVector },
    Ping { ping: bool },
}

impl InferenceRequest {
    pub fn ping() -> Self {
        InferenceRequest::Ping { ping: true }
    }
    /// A `state` key takes precedence over `ping`; objects with neither are
    /// unknown messages.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(line).map_err(|_| ProtocolError::InvalidJson)?;
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::UnknownMessage);
        };
        if let Some(state) = fields.remove("state") {
            let values: Vec<f32> = serde_json::from_value(state).map_err(|e| {
                ProtocolError::InvalidShape(format!("state must be an array of numbers: {e}"))
            })?;
            if values.len() != STATE_SIZE {
                return Err(ProtocolError::InvalidStateSize);
            }
            let state = StateVector::try_from(values.as_slice())
                .map_err(|_| ProtocolError::InvalidStateSize)?;
            return Ok(InferenceRequest::Infer { state });
        }
        if fields.contains_key("ping") {
            return Ok(InferenceRequest::ping());
        }
        Err(ProtocolError::UnknownMessage)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InferenceReply {
    Action { action: u8 },
    Pong { pong: bool },
    Error { error: String },
}

impl From<Action> for InferenceReply {
    fn from(action: Action) -> Self {
        InferenceReply::Action {
            action: action.index() as u8,
        }
    }
}

impl From<&ProtocolError> for InferenceReply {
    fn from(error: &ProtocolError) -> Self {
        InferenceReply::Error {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn state_request_decodes_to_vector() {
        let line = serde_json::json!({ "state": (0..14).collect::<Vec<_>>() }).to_string();
        let InferenceRequest::Infer { state } = InferenceRequest::decode(&line).unwrap() else {
            panic!("expected an inference request");
        };
        assert_eq!(state.0[13], 13.0);
    }

    #[test]
    fn encoded_requests_decode_back() {
        let request = InferenceRequest::Infer {
            state: StateVector([0.5; STATE_SIZE]),
        };
        let line = serde_json::to_string(&request).unwrap();
        assert_eq!(InferenceRequest::decode(&line).unwrap(), request);
        let line = serde_json::to_string(&InferenceRequest::ping()).unwrap();
        assert_eq!(line, r#"{"ping":true}"#);
    }

    #[rstest]
    #[case(r#"{"ping": true}"#)]
    #[case(r#"{"ping": 1}"#)]
    #[case(r#"{"ping": null, "other": 3}"#)]
    fn any_ping_value_is_a_health_check(#[case] line: &str) {
        assert_eq!(
            InferenceRequest::decode(line).unwrap(),
            InferenceRequest::ping()
        );
    }

    #[rstest]
    #[case(r#"{"state": [0, 0, 0, 0, 0]}"#, "Invalid state size")]
    #[case(r#"{"state": []}"#, "Invalid state size")]
    #[case("{\"state\": [0.0", "Invalid JSON")]
    #[case(r#"{"hello": "world"}"#, "Unknown message type")]
    #[case("42", "Unknown message type")]
    fn rejected_lines_map_to_error_text(#[case] line: &str, #[case] text: &str) {
        let error = InferenceRequest::decode(line).unwrap_err();
        assert_eq!(
            InferenceReply::from(&error),
            InferenceReply::Error {
                error: text.to_string()
            }
        );
    }

    #[test]
    fn non_numeric_state_is_an_error() {
        let error = InferenceRequest::decode(r#"{"state": ["a", 1]}"#).unwrap_err();
        assert!(matches!(error, ProtocolError::InvalidShape(_)));
    }

    #[rstest]
    #[case(InferenceReply::from(Action::Up), r#"{"action":2}"#)]
    #[case(InferenceReply::Pong { pong: true }, r#"{"pong":true}"#)]
    #[case(InferenceReply::from(&ProtocolError::InvalidJson), r#"{"error":"Invalid JSON"}"#)]
    fn replies_encode_as_flat_objects(#[case] reply: InferenceReply, #[case] line: &str) {
        assert_eq!(serde_json::to_string(&reply).unwrap(), line);
        assert_eq!(serde_json::from_str::<InferenceReply>(line).unwrap(), reply);
    }
}
