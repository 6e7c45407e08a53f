mod agent;
mod agent_config;
mod learner_schedule;

pub use agent::{Agent, AgentError, LoadOutcome, UpdateOutcome};
pub use agent_config::{AgentConfig, InvalidConfig};
pub use learner_schedule::LearnerSchedule;
