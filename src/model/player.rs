use serde::{Deserialize, Serialize};

use super::{MapSize, TurnMode};

/// A player's in-game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: String,
    pub nickname: String,
    pub coins: i32,
    /// Consecutive end-of-turn evaluations holding a strict structure
    /// majority.
    pub dominance_turn_counter: u32,
    pub is_disconnected: bool,
}

impl PlayerState {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        PlayerState {
            id: id.into(),
            nickname: nickname.into(),
            coins: 0,
            dominance_turn_counter: 0,
            is_disconnected: false,
        }
    }
}

/// Configurable options for a game, fixed at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoomSettings {
    pub map_size: MapSize,
    /// Seconds per turn.
    pub turn_timer: u32,
    pub turn_mode: TurnMode,
}

impl Default for RoomSettings {
    fn default() -> Self {
        RoomSettings {
            map_size: MapSize::Medium,
            turn_timer: 90,
            turn_mode: TurnMode::Alternating,
        }
    }
}

/// End-of-game statistics, tracked per player as the game runs.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct MatchStats {
    pub turns_played: u32,
    pub troops_killed: u32,
    pub troops_lost: u32,
    pub structures_held: u32,
    pub total_damage_dealt: i32,
}
