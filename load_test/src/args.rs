use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestKind {
    Single,
    Concurrent,
    Sustained,
    Health,
    All,
}

impl TestKind {
    pub fn includes(self, kind: TestKind) -> bool {
        self == TestKind::All || self == kind
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Load test the inference server", long_about = None)]
pub struct Args {
    #[arg(long, default_value = "localhost")]
    pub host: String,
    #[arg(long, default_value_t = ports::INFERENCE)]
    pub port: u16,
    #[arg(long, value_enum, default_value_t = TestKind::All)]
    pub test: TestKind,
    /// Number of requests for the concurrent test.
    #[arg(long, default_value_t = 10)]
    pub requests: usize,
    /// Number of worker threads for the concurrent test.
    #[arg(long, default_value_t = 5)]
    pub workers: usize,
    /// Duration of the sustained test, in seconds.
    #[arg(long, default_value_t = 30)]
    pub duration: u64,
    /// Requests per second for the sustained test.
    #[arg(long, default_value_t = 5)]
    pub rps: usize,
}
