use super::{LearningStepInfo, ModelError, Params};
use replay_data::Action;

pub trait Actor<State> {
    fn best_action(&self, state: &State) -> Result<Action, ModelError>;
}

pub trait BasicLearner<Batch> {
    fn train_batch(&mut self, batch: &Batch) -> Result<LearningStepInfo, ModelError>;
}

pub trait TargetNet {
    fn copy_control_to_target(&mut self) -> Result<(), ModelError>;
}

pub trait ParamFetcher {
    fn params(&self) -> Result<Params, ModelError>;
    fn set_params(&mut self, params: &Params) -> Result<(), ModelError>;
}
