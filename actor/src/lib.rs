pub mod config;
pub mod env;
pub mod evaluation;
pub mod hybrid;
pub mod training;
