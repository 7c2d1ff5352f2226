//! Peer networking: wire protocol, transports and latency tracking

pub mod direct;
pub mod hub;
pub mod protocol;
pub mod timing;
pub mod transport;
