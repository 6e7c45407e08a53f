use crate::connection::serve_connection;
use log::{debug, info, warn};
use model::{load_policy, CheckpointError, QNetwork};
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// How often the accept loop checks for a shutdown request.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("could not load model: {0}")]
    Load(#[from] CheckpointError),
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("listener failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle clients are dropped after this long. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: ports::INFERENCE,
            read_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Asks a running [`InferenceServer`] to stop accepting clients.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct InferenceServer {
    policy: Arc<QNetwork>,
    listener: TcpListener,
    read_timeout: Option<Duration>,
    shutdown: ShutdownHandle,
}

impl InferenceServer {
    /// Loads the policy held by `model_path` and binds the listening socket.
    pub fn load<P: AsRef<Path>>(model_path: P, config: &ServerConfig) -> Result<Self, ServerError> {
        let model_path = model_path.as_ref();
        let policy = load_policy(model_path)?;
        info!("loaded model from {}", model_path.display());
        Self::with_policy(policy, config)
    }
    pub fn with_policy(policy: QNetwork, config: &ServerConfig) -> Result<Self, ServerError> {
        let listener =
            TcpListener::bind((config.host.as_str(), config.port)).map_err(|source| {
                ServerError::Bind {
                    addr: format!("{}:{}", config.host, config.port),
                    source,
                }
            })?;
        Ok(Self {
            policy: Arc::new(policy),
            listener,
            read_timeout: config.read_timeout,
            shutdown: ShutdownHandle::default(),
        })
    }
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accepts clients until shutdown is requested, serving each on its own
    /// thread. The listening socket is closed on return; clients already
    /// connected are served until they disconnect or time out.
    pub fn run(self) -> Result<(), ServerError> {
        self.listener.set_nonblocking(true)?;
        info!("inference server listening on {}", self.local_addr()?);
        while !self.shutdown.is_requested() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.spawn_worker(stream, peer),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("accept failed: {e}");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
        info!("inference server shutting down");
        Ok(())
    }

    fn spawn_worker(&self, stream: TcpStream, peer: SocketAddr) {
        debug!("connection from {peer}");
        if let Err(e) = stream.set_nonblocking(false) {
            warn!("dropping {peer}: {e}");
            return;
        }
        let policy = Arc::clone(&self.policy);
        let read_timeout = self.read_timeout;
        let spawned = thread::Builder::new()
            .name(format!("client-{peer}"))
            .spawn(move || match serve_connection(&policy, stream, read_timeout) {
                Ok(replies) => debug!("{peer} disconnected after {replies} replies"),
                Err(e) if e.is_timeout() => info!("{peer} idle for too long, closing"),
                Err(e) => warn!("connection to {peer} failed: {e}"),
            });
        if let Err(e) = spawned {
            warn!("could not spawn worker for {peer}: {e}");
        }
    }
}
