use std::sync::Arc;
use std::time::Instant;

use actix::Addr;

use crate::config::{Balance, ServerConfig};
use crate::store::Store;

use super::players::PlayerRegistry;
use super::registry::EngineRegistry;

/// Shared application state handed to every HTTP and WebSocket handler.
pub struct AppState {
    pub registry: Addr<EngineRegistry>,
    pub players: Arc<PlayerRegistry>,
    pub store: Store,
    pub balance: Arc<Balance>,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}
