//! Per-game delivery hub: the set of connected client sessions, with
//! broadcast and unicast. Owned exclusively by the game's engine actor.

use std::collections::HashMap;

use actix::prelude::*;
use log::{debug, warn};
use serde::Serialize;

use super::messages::envelope;
use super::session::{CloseSession, GameSocket, ServerFrame};

/// Sessions keyed by player id. A full outbound buffer marks the session as
/// stuck: it is dropped from the hub and reported back to the caller so the
/// engine can walk the disconnect path.
#[derive(Default)]
pub struct GameHub {
    sessions: HashMap<String, Addr<GameSocket>>,
}

impl GameHub {
    pub fn new() -> Self {
        GameHub::default()
    }

    pub fn register(&mut self, player_id: &str, addr: Addr<GameSocket>) {
        self.sessions.insert(player_id.to_string(), addr);
    }

    pub fn unregister(&mut self, player_id: &str) {
        self.sessions.remove(player_id);
    }

    pub fn is_connected(&self, player_id: &str) -> bool {
        self.sessions.contains_key(player_id)
    }

    pub fn connected_count(&self) -> usize {
        self.sessions.len()
    }

    /// Sends a frame to every session. Returns the ids of sessions that were
    /// dropped because their buffer was full or their mailbox closed.
    pub fn broadcast(&mut self, frame: &str) -> Vec<String> {
        let mut dropped = Vec::new();
        for (player_id, addr) in &self.sessions {
            match addr.try_send(ServerFrame(frame.to_string())) {
                Ok(()) => {}
                Err(SendError::Full(_)) => {
                    warn!("[Hub] outbound buffer full, closing session player_id={player_id}");
                    dropped.push(player_id.clone());
                }
                Err(SendError::Closed(_)) => {
                    debug!("[Hub] session gone player_id={player_id}");
                    dropped.push(player_id.clone());
                }
            }
        }
        for player_id in &dropped {
            self.sessions.remove(player_id);
        }
        dropped
    }

    /// Serializes and broadcasts a typed message. Returns dropped sessions.
    pub fn broadcast_message<T: Serialize>(&mut self, kind: &str, data: &T) -> Vec<String> {
        match envelope(kind, data) {
            Ok(frame) => self.broadcast(&frame),
            Err(e) => {
                warn!("[Hub] failed to serialize {kind} broadcast: {e}");
                Vec::new()
            }
        }
    }

    /// Sends a frame to one player. False if they are not connected or their
    /// buffer is full.
    pub fn send_to(&mut self, player_id: &str, frame: &str) -> bool {
        let Some(addr) = self.sessions.get(player_id) else {
            return false;
        };
        match addr.try_send(ServerFrame(frame.to_string())) {
            Ok(()) => true,
            Err(e) => {
                warn!("[Hub] unicast failed player_id={player_id}: {e}");
                self.sessions.remove(player_id);
                false
            }
        }
    }

    /// Serializes and unicasts a typed message.
    pub fn send_message_to<T: Serialize>(&mut self, player_id: &str, kind: &str, data: &T) -> bool {
        match envelope(kind, data) {
            Ok(frame) => self.send_to(player_id, &frame),
            Err(e) => {
                warn!("[Hub] failed to serialize {kind} unicast: {e}");
                false
            }
        }
    }

    /// Asks every session to close and clears the hub.
    pub fn close_all(&mut self) {
        for (player_id, addr) in self.sessions.drain() {
            debug!("[Hub] closing session player_id={player_id}");
            addr.do_send(CloseSession { reason: "game shutting down".to_string() });
        }
    }
}
