use log::info;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct LoadReport {
    pub name: &'static str,
    pub successes: usize,
    pub failures: usize,
    pub total_time: Duration,
    /// Latency of every successful request.
    pub latencies: Vec<Duration>,
}

impl LoadReport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            successes: 0,
            failures: 0,
            total_time: Duration::ZERO,
            latencies: vec![],
        }
    }
    pub fn record(&mut self, outcome: Result<Duration, impl std::fmt::Display>) {
        match outcome {
            Ok(latency) => {
                self.successes += 1;
                self.latencies.push(latency);
            }
            Err(e) => {
                self.failures += 1;
                info!("{} request failed: {e}", self.name);
            }
        }
    }
    pub fn total_requests(&self) -> usize {
        self.successes + self.failures
    }
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.total_requests() as f64 / secs
        } else {
            0.0
        }
    }
    pub fn success_rate(&self) -> f64 {
        match self.total_requests() {
            0 => 0.0,
            total => self.successes as f64 / total as f64,
        }
    }
    pub fn min_latency(&self) -> Option<Duration> {
        self.latencies.iter().min().copied()
    }
    pub fn max_latency(&self) -> Option<Duration> {
        self.latencies.iter().max().copied()
    }
    pub fn mean_latency(&self) -> Option<Duration> {
        let n = u32::try_from(self.latencies.len()).ok().filter(|&n| n > 0)?;
        Some(self.latencies.iter().sum::<Duration>() / n)
    }
    pub fn is_success(&self) -> bool {
        self.failures == 0 && self.successes > 0
    }

    pub fn log(&self) {
        info!("{} results:", self.name);
        info!("  successful: {}/{}", self.successes, self.total_requests());
        info!("  failed: {}/{}", self.failures, self.total_requests());
        info!("  success rate: {:.1}%", self.success_rate() * 100.0);
        info!("  total time: {:.3}s", self.total_time.as_secs_f64());
        info!("  requests/second: {:.2}", self.requests_per_second());
        if let (Some(min), Some(mean), Some(max)) =
            (self.min_latency(), self.mean_latency(), self.max_latency())
        {
            info!(
                "  latency min/mean/max: {:.3}s / {:.3}s / {:.3}s",
                min.as_secs_f64(),
                mean.as_secs_f64(),
                max.as_secs_f64()
            );
        }
    }
}
