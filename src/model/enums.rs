use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of the per-game phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    WaitingForPlayers,
    GeneratingMap,
    GameStarted,
    TurnStart,
    StructureCombat,
    PlayerAction,
    TurnTransition,
    GameOver,
}

/// How turns are structured. Only alternating is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    Alternating,
    Simultaneous,
}

/// Map size determines the hex grid radius and structure counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSize {
    Small,
    Medium,
    Large,
}

impl MapSize {
    pub fn radius(self) -> i32 {
        match self {
            MapSize::Small => 7,
            MapSize::Medium => 10,
            MapSize::Large => 13,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MapSize::Small => "small",
            MapSize::Medium => "medium",
            MapSize::Large => "large",
        }
    }
}

/// The four troop types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroopKind {
    Marine,
    Sniper,
    Hoverbike,
    Mech,
}

impl TroopKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TroopKind::Marine => "marine",
            TroopKind::Sniper => "sniper",
            TroopKind::Hoverbike => "hoverbike",
            TroopKind::Mech => "mech",
        }
    }
}

/// The three structure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Outpost,
    CommandCenter,
    Hq,
}

impl StructureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StructureKind::Outpost => "outpost",
            StructureKind::CommandCenter => "command_center",
            StructureKind::Hq => "hq",
        }
    }
}

/// The five terrain types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Plains,
    Forest,
    Hills,
    Water,
    Mountains,
}

impl TerrainKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TerrainKind::Plains => "plains",
            TerrainKind::Forest => "forest",
            TerrainKind::Hills => "hills",
            TerrainKind::Water => "water",
            TerrainKind::Mountains => "mountains",
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    #[serde(rename = "HQ_DESTROYED")]
    HqDestroyed,
    #[serde(rename = "STRUCTURE_DOMINANCE")]
    StructureDominance,
    #[serde(rename = "SUDDEN_DEATH")]
    SuddenDeath,
    #[serde(rename = "FORFEIT")]
    Forfeit,
    #[serde(rename = "DISCONNECT")]
    Disconnect,
    #[serde(rename = "DRAW")]
    Draw,
}

/// Stable machine-readable error codes sent back in nacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "NOT_YOUR_TURN")]
    NotYourTurn,
    #[serde(rename = "INVALID_MOVE")]
    InvalidMove,
    #[serde(rename = "INVALID_ATTACK")]
    InvalidAttack,
    #[serde(rename = "INSUFFICIENT_FUNDS")]
    InsufficientFunds,
    #[serde(rename = "SPAWN_OCCUPIED")]
    SpawnOccupied,
    #[serde(rename = "SPAWN_NOT_OWNED")]
    SpawnNotOwned,
    #[serde(rename = "UNIT_ALREADY_ACTED")]
    UnitAlreadyActed,
    #[serde(rename = "UNIT_NOT_READY")]
    UnitNotReady,
    #[serde(rename = "UNIT_NOT_FOUND")]
    UnitNotFound,
    #[serde(rename = "GAME_NOT_FOUND")]
    GameNotFound,
    #[serde(rename = "ROOM_NOT_FOUND")]
    RoomNotFound,
    #[serde(rename = "ROOM_FULL")]
    RoomFull,
    #[serde(rename = "ROOM_EXPIRED")]
    RoomExpired,
    #[serde(rename = "INVALID_MESSAGE")]
    InvalidMessage,
    #[serde(rename = "RATE_LIMITED")]
    RateLimited,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotYourTurn => "NOT_YOUR_TURN",
            ErrorCode::InvalidMove => "INVALID_MOVE",
            ErrorCode::InvalidAttack => "INVALID_ATTACK",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::SpawnOccupied => "SPAWN_OCCUPIED",
            ErrorCode::SpawnNotOwned => "SPAWN_NOT_OWNED",
            ErrorCode::UnitAlreadyActed => "UNIT_ALREADY_ACTED",
            ErrorCode::UnitNotReady => "UNIT_NOT_READY",
            ErrorCode::UnitNotFound => "UNIT_NOT_FOUND",
            ErrorCode::GameNotFound => "GAME_NOT_FOUND",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::RoomFull => "ROOM_FULL",
            ErrorCode::RoomExpired => "ROOM_EXPIRED",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::RateLimited => "RATE_LIMITED",
        };
        f.write_str(s)
    }
}
