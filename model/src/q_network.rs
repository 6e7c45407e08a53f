use crate::params::{restore, snapshot};
use crate::traits::{Actor, ParamFetcher};
use crate::{ModelError, Params, HIDDEN_SIZE};
use candle_core::{DType, Device, Module, Tensor, Var};
use candle_nn::{linear, Linear, VarBuilder, VarMap};
use replay_data::{Action, StateVector, STATE_SIZE};

/// `14 -> 128 -> ReLU -> 128 -> ReLU -> 3` action-value network.
pub struct QNetwork {
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
    varmap: VarMap,
    device: Device,
}

impl QNetwork {
    pub fn new(device: &Device) -> Result<Self, ModelError> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let fc1 = linear(STATE_SIZE, HIDDEN_SIZE, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN_SIZE, HIDDEN_SIZE, vb.pp("fc2"))?;
        let fc3 = linear(HIDDEN_SIZE, Action::COUNT, vb.pp("fc3"))?;
        Ok(Self {
            fc1,
            fc2,
            fc3,
            varmap,
            device: device.clone(),
        })
    }
    pub fn from_params(device: &Device, params: &Params) -> Result<Self, ModelError> {
        let mut network = Self::new(device)?;
        network.set_params(params)?;
        Ok(network)
    }
    pub fn device(&self) -> &Device {
        &self.device
    }
    /// Trainable variables, sorted by name.
    pub fn named_vars(&self) -> Vec<(String, Var)> {
        let data = self
            .varmap
            .data()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut vars: Vec<_> = data
            .iter()
            .map(|(name, var)| (name.clone(), var.clone()))
            .collect();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        vars
    }
    /// `states` is `(batch, 14)`; the result is `(batch, 3)`.
    pub fn forward(&self, states: &Tensor) -> candle_core::Result<Tensor> {
        let xs = self.fc1.forward(states)?.relu()?;
        let xs = self.fc2.forward(&xs)?.relu()?;
        self.fc3.forward(&xs)
    }
    pub fn q_values(&self, state: &StateVector) -> Result<[f32; Action::COUNT], ModelError> {
        let input = Tensor::from_slice(state.as_slice(), (1, STATE_SIZE), &self.device)?;
        let output = self.forward(&input)?.squeeze(0)?.to_vec1::<f32>()?;
        let mut q_values = [0.0; Action::COUNT];
        q_values.copy_from_slice(&output);
        Ok(q_values)
    }
}

/// Index of the largest value; the lowest index wins a tie.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = i;
        }
    }
    best
}

impl Actor<StateVector> for QNetwork {
    fn best_action(&self, state: &StateVector) -> Result<Action, ModelError> {
        let q_values = self.q_values(state)?;
        Ok(Action::ALL[argmax(&q_values)])
    }
}

impl ParamFetcher for QNetwork {
    fn params(&self) -> Result<Params, ModelError> {
        snapshot(&self.named_vars())
    }
    fn set_params(&mut self, params: &Params) -> Result<(), ModelError> {
        restore(&self.named_vars(), params)
    }
}
