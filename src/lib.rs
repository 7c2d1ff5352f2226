//! Gravwell - peer-to-peer multiplayer orbital combat
//!
//! Each client simulates one spacecraft orbiting a shared sun and replicates
//! its state to every peer over a websocket relay, upgrading to a direct UDP
//! channel per peer when offer/answer signaling succeeds. There is no
//! authoritative server for game state: every ship is owned by exactly one
//! client and merged into everyone else's registry from periodic reports.

pub mod config;
pub mod net;
pub mod relay;
pub mod sim;
pub mod util;
