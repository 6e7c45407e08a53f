mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use inference_server::{InferenceServer, ServerConfig, ShutdownHandle};
use log::info;
use nix::sys::signal::{self, SigHandler, Signal};
use std::sync::OnceLock;
use std::time::Duration;

// The server answers every client on its own thread for as long as the
// process lives; jemalloc keeps the per-request allocations from
// fragmenting the heap.
#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

static SHUTDOWN: OnceLock<ShutdownHandle> = OnceLock::new();

extern "C" fn handle_sigint(_: nix::libc::c_int) {
    if let Some(shutdown) = SHUTDOWN.get() {
        shutdown.request();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        read_timeout: (args.read_timeout_secs > 0)
            .then(|| Duration::from_secs(args.read_timeout_secs)),
    };
    let server = InferenceServer::load(&args.model, &config)
        .with_context(|| format!("starting inference server for {}", args.model.display()))?;
    SHUTDOWN.get_or_init(|| server.shutdown_handle());
    // SAFETY: the handler only stores to an atomic flag.
    unsafe { signal::signal(Signal::SIGINT, SigHandler::Handler(handle_sigint)) }
        .context("installing SIGINT handler")?;
    server.run().context("serving")?;
    info!("stopped");
    Ok(())
}
