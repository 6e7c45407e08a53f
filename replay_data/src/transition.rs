use crate::{Action, StateVector};

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: StateVector,
    pub action: Action,
    pub reward: f32,
    pub next_state: StateVector,
    pub done: bool,
}

/// A sampled minibatch laid out as parallel columns.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub states: Vec<StateVector>,
    pub actions: Vec<Action>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<StateVector>,
    pub dones: Vec<bool>,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            next_states: Vec::with_capacity(capacity),
            dones: Vec::with_capacity(capacity),
        }
    }
    pub fn push(&mut self, transition: &Transition) {
        self.states.push(transition.state);
        self.actions.push(transition.action);
        self.rewards.push(transition.reward);
        self.next_states.push(transition.next_state);
        self.dones.push(transition.done);
    }
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
