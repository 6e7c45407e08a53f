use std::net::{Ipv4Addr, SocketAddr};

/// Port the game simulator listens on when started with `--server`.
pub const SIMULATOR: u16 = 6000;
pub const INFERENCE: u16 = 5001;

pub fn simulator_addr() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, SIMULATOR).into()
}
