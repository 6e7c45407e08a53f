use crate::params::{restore, snapshot};
use crate::{ModelError, Params};
use candle_core::backprop::GradStore;
use candle_core::Var;
use candle_nn::Optimizer;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdamConfig {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

/// Everything needed to resume optimisation where it stopped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdamState {
    pub step: u64,
    pub lr: f64,
    pub first_moments: Params,
    pub second_moments: Params,
}

/// Adam with bias-corrected moment estimates and no weight decay.
pub struct Adam {
    params: Vec<(String, Var)>,
    first_moments: Vec<(String, Var)>,
    second_moments: Vec<(String, Var)>,
    config: AdamConfig,
    step: u64,
}

impl Adam {
    /// `params` must be sorted by name so that exported state lines up with
    /// the variables on reload.
    pub fn from_named_vars(
        params: Vec<(String, Var)>,
        config: AdamConfig,
    ) -> candle_core::Result<Self> {
        let zeros_like = |params: &[(String, Var)]| {
            params
                .iter()
                .map(|(name, var)| {
                    Var::zeros(var.dims(), var.dtype(), var.device()).map(|m| (name.clone(), m))
                })
                .collect::<candle_core::Result<Vec<_>>>()
        };
        Ok(Self {
            first_moments: zeros_like(&params)?,
            second_moments: zeros_like(&params)?,
            params,
            config,
            step: 0,
        })
    }
    pub fn step_count(&self) -> u64 {
        self.step
    }
    pub fn state(&self) -> Result<AdamState, ModelError> {
        Ok(AdamState {
            step: self.step,
            lr: self.config.lr,
            first_moments: snapshot(&self.first_moments)?,
            second_moments: snapshot(&self.second_moments)?,
        })
    }
    pub fn load_state(&mut self, state: &AdamState) -> Result<(), ModelError> {
        restore(&self.first_moments, &state.first_moments)?;
        restore(&self.second_moments, &state.second_moments)?;
        self.step = state.step;
        self.config.lr = state.lr;
        Ok(())
    }
}

impl Optimizer for Adam {
    type Config = AdamConfig;

    fn new(vars: Vec<Var>, config: AdamConfig) -> candle_core::Result<Self> {
        let named = vars
            .into_iter()
            .enumerate()
            .map(|(i, var)| (format!("var{i:04}"), var))
            .collect();
        Self::from_named_vars(named, config)
    }

    fn step(&mut self, grads: &GradStore) -> candle_core::Result<()> {
        self.step += 1;
        let AdamConfig {
            lr,
            beta1,
            beta2,
            eps,
        } = self.config;
        let step = i32::try_from(self.step).unwrap_or(i32::MAX);
        let scale_m = 1.0 / (1.0 - beta1.powi(step));
        let scale_v = 1.0 / (1.0 - beta2.powi(step));
        let moments = self.first_moments.iter().zip(&self.second_moments);
        for ((_, theta), ((_, m), (_, v))) in self.params.iter().zip(moments) {
            let Some(g) = grads.get(theta) else {
                continue;
            };
            let next_m = ((m.as_tensor() * beta1)? + (g * (1.0 - beta1))?)?;
            let next_v = ((v.as_tensor() * beta2)? + (g.sqr()? * (1.0 - beta2))?)?;
            let m_hat = (&next_m * scale_m)?;
            let v_hat = (&next_v * scale_v)?;
            let update = (m_hat / (v_hat.sqrt()? + eps)?)?;
            let next_theta = (theta.as_tensor() - (update * lr)?)?;
            m.set(&next_m)?;
            v.set(&next_v)?;
            theta.set(&next_theta)?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.config.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.config.lr = lr;
    }
}
