//! Authoritative server core for a two-player, turn-based hex tactics game.
//!
//! Clients connect over WebSockets; every game runs inside its own engine
//! actor that owns the state, the seeded dice stream, the timers, and the
//! delivery hub. Snapshots go to a key-value store at end of turn and on
//! shutdown, and unfinished games are restored on boot.

pub mod config;
pub mod dice;
pub mod game;
pub mod hex;
pub mod mapgen;
pub mod model;
pub mod server;
pub mod store;
