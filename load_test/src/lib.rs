//! Load driver for the inference service. Every request opens a fresh
//! connection, the way a short-lived game client would.

mod report;
mod tester;

pub use report::LoadReport;
pub use tester::{LoadTester, RequestError};
