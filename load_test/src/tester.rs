use crate::LoadReport;
use crossbeam_channel::{bounded, unbounded};
use log::{debug, info};
use packets::{InferenceReply, InferenceRequest};
use rand::Rng;
use replay_data::StateVector;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};
use tcp_io::{write_frame, FrameError, FrameReader};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Transport(#[from] FrameError),
    #[error("server closed the connection without replying")]
    NoReply,
    #[error("unreadable reply {0:?}")]
    BadReply(String),
    #[error("server replied with an error: {0}")]
    Rejected(String),
    #[error("unexpected reply {0:?}")]
    Unexpected(InferenceReply),
}

pub struct LoadTester {
    addr: String,
    timeout: Duration,
}

fn random_state() -> StateVector {
    let mut rng = rand::thread_rng();
    let mut state = StateVector::zeros();
    for value in state.0.iter_mut() {
        *value = rng.gen_range(-1.0..1.0);
    }
    state
}

impl LoadTester {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(5),
        }
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends one request on a fresh connection and waits for its reply.
    pub fn send_request(&self, request: &InferenceRequest) -> Result<InferenceReply, RequestError> {
        let stream = TcpStream::connect(&self.addr).map_err(|source| RequestError::Connect {
            addr: self.addr.clone(),
            source,
        })?;
        stream.set_nodelay(true).map_err(FrameError::from)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(FrameError::from)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(FrameError::from)?;
        write_frame(&stream, request)?;
        let line = FrameReader::new(&stream)
            .read_frame()?
            .ok_or(RequestError::NoReply)?;
        serde_json::from_str(&line).map_err(|_| RequestError::BadReply(line))
    }

    fn timed_inference(&self) -> Result<Duration, RequestError> {
        let request = InferenceRequest::Infer {
            state: random_state(),
        };
        let start = Instant::now();
        match self.send_request(&request)? {
            InferenceReply::Action { action } => {
                debug!("action {action}");
                Ok(start.elapsed())
            }
            InferenceReply::Error { error } => Err(RequestError::Rejected(error)),
            reply => Err(RequestError::Unexpected(reply)),
        }
    }

    /// One inference request, as a latency probe.
    pub fn single(&self) -> LoadReport {
        info!("testing single request...");
        let mut report = LoadReport::new("single");
        let start = Instant::now();
        report.record(self.timed_inference());
        report.total_time = start.elapsed();
        report
    }

    /// `requests` inference requests spread over a pool of `workers` threads.
    pub fn concurrent(&self, requests: usize, workers: usize) -> LoadReport {
        info!("testing {requests} concurrent requests with {workers} workers...");
        let mut report = LoadReport::new("concurrent");
        let (job_sender, job_receiver) = bounded::<()>(requests);
        let (result_sender, result_receiver) = unbounded();
        for _ in 0..requests {
            // capacity equals the job count, so this never blocks
            let _ = job_sender.send(());
        }
        drop(job_sender);
        let start = Instant::now();
        thread::scope(|scope| {
            for _ in 0..workers.max(1) {
                let job_receiver = job_receiver.clone();
                let result_sender = result_sender.clone();
                scope.spawn(move || {
                    for () in job_receiver.iter() {
                        if result_sender.send(self.timed_inference()).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_sender);
        report.total_time = start.elapsed();
        for outcome in result_receiver.iter() {
            report.record(outcome);
        }
        report
    }

    /// `rps` sequential requests every second for `duration`.
    pub fn sustained(&self, duration: Duration, rps: usize) -> LoadReport {
        info!(
            "testing sustained load: {rps} req/s for {}s...",
            duration.as_secs_f64()
        );
        let mut report = LoadReport::new("sustained");
        let start = Instant::now();
        while start.elapsed() < duration {
            let second_start = Instant::now();
            for _ in 0..rps {
                report.record(self.timed_inference());
            }
            let spent = second_start.elapsed();
            if spent < Duration::from_secs(1) {
                thread::sleep(Duration::from_secs(1) - spent);
            }
        }
        report.total_time = start.elapsed();
        report
    }

    /// A ping, which must be answered with a pong.
    pub fn health(&self) -> LoadReport {
        info!("testing server health...");
        let mut report = LoadReport::new("health");
        let start = Instant::now();
        let outcome = match self.send_request(&InferenceRequest::ping()) {
            Ok(InferenceReply::Pong { pong: true }) => Ok(start.elapsed()),
            Ok(reply) => Err(RequestError::Unexpected(reply)),
            Err(e) => Err(e),
        };
        report.record(outcome);
        report.total_time = start.elapsed();
        if report.is_success() {
            info!("server is healthy");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_data::STATE_SIZE;
    use std::net::TcpListener;

    #[test]
    fn random_states_are_bounded() {
        let state = random_state();
        assert_eq!(state.0.len(), STATE_SIZE);
        assert!(state.0.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn unreachable_server_counts_as_failure() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let tester = LoadTester::new(addr);
        let report = tester.concurrent(4, 2);
        assert_eq!((report.successes, report.failures), (0, 4));
        assert!(!tester.health().is_success());
    }
}
