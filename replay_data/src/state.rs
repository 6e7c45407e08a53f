use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STATE_SIZE: usize = 14;

/// Flattened observation fed to the value network:
///
/// | index | meaning |
/// |-------|---------|
/// | 0..4  | ball x, y, vx, vy |
/// | 4..8  | player paddle x, y, width, height |
/// | 8..12 | bot paddle x, y, width, height |
/// | 12    | player score |
/// | 13    | bot score |
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVector(pub [f32; STATE_SIZE]);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected a state of 14 values, got {actual}")]
pub struct InvalidStateSize {
    pub actual: usize,
}

impl StateVector {
    pub fn zeros() -> Self {
        Self([0.0; STATE_SIZE])
    }
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
    pub fn player_score(&self) -> f32 {
        self.0[12]
    }
    pub fn bot_score(&self) -> f32 {
        self.0[13]
    }
}

impl From<[f32; STATE_SIZE]> for StateVector {
    fn from(values: [f32; STATE_SIZE]) -> Self {
        Self(values)
    }
}

impl TryFrom<&[f32]> for StateVector {
    type Error = InvalidStateSize;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        let values: [f32; STATE_SIZE] = values.try_into().map_err(|_| InvalidStateSize {
            actual: values.len(),
        })?;
        Ok(Self(values))
    }
}
