//! Server layer: wire messages, per-game engine actors, the engine
//! registry, WebSocket sessions, the delivery hub, player auth, and routing.

pub mod engine;
pub mod hub;
pub mod messages;
pub mod players;
pub mod registry;
pub mod router;
pub mod session;
pub mod state;
