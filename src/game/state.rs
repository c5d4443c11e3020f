use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::Balance;
use crate::hex::{Coord, Grid};
use crate::model::{
    GamePhase, MapSize, MatchStats, PlayerState, RoomSettings, Structure, StructureKind,
    TerrainKind, TerrainMap, Troop, TurnMode,
};

/// The complete authoritative state of one game.
///
/// Troops and structures live in insertion-ordered vectors so that iteration
/// order (structure fire, healing, storm damage) is deterministic and every
/// transcript is reproducible from the seed and the action sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub id: String,
    pub phase: GamePhase,
    pub map_size: MapSize,
    pub turn_mode: TurnMode,
    /// Seconds per turn.
    pub turn_timer: u32,
    /// 0 until the first turn starts.
    pub turn_number: u32,
    /// Index into `players`: 0 or 1.
    pub active_player: usize,
    pub players: [PlayerState; 2],
    pub troops: Vec<Troop>,
    pub structures: Vec<Structure>,
    pub terrain: TerrainMap,
    /// Not serialized; rebuilt from the map size on load.
    #[serde(skip)]
    pub grid: Grid,
    pub seed: u64,
    /// Unix seconds.
    pub created_at: u64,
    pub turn_started_at: u64,

    pub sudden_death_active: bool,
    /// Turns elapsed since sudden death activated.
    pub sudden_death_turn: u32,
    pub safe_zone_radius: i32,

    pub stats: [MatchStats; 2],

    /// Player 0 cannot attack on turn 1.
    pub first_turn_restriction: bool,
}

pub(crate) fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

impl GameState {
    /// Creates an empty game state ready for map generation.
    pub fn new(
        id: impl Into<String>,
        settings: RoomSettings,
        mut p1: PlayerState,
        mut p2: PlayerState,
        seed: u64,
        balance: &Balance,
    ) -> Self {
        p1.coins = balance.starting_coins();
        p2.coins = balance.starting_coins();
        let radius = settings.map_size.radius();

        GameState {
            id: id.into(),
            phase: GamePhase::WaitingForPlayers,
            map_size: settings.map_size,
            turn_mode: settings.turn_mode,
            turn_timer: settings.turn_timer,
            turn_number: 0,
            active_player: 0,
            players: [p1, p2],
            troops: Vec::new(),
            structures: Vec::new(),
            terrain: TerrainMap::new(),
            grid: Grid::new(radius),
            seed,
            created_at: now_unix(),
            turn_started_at: 0,
            sudden_death_active: false,
            sudden_death_turn: 0,
            safe_zone_radius: radius,
            stats: [MatchStats::default(), MatchStats::default()],
            first_turn_restriction: true,
        }
    }

    pub fn active_player_id(&self) -> &str {
        &self.players[self.active_player].id
    }

    pub fn inactive_player_id(&self) -> &str {
        &self.players[1 - self.active_player].id
    }

    /// 0 or 1 for a known player id.
    pub fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn is_active_player(&self, player_id: &str) -> bool {
        self.active_player_id() == player_id
    }

    pub fn get_troop(&self, unit_id: &str) -> Option<&Troop> {
        self.troops.iter().find(|t| t.id == unit_id)
    }

    pub fn get_troop_mut(&mut self, unit_id: &str) -> Option<&mut Troop> {
        self.troops.iter_mut().find(|t| t.id == unit_id)
    }

    pub fn get_structure(&self, structure_id: &str) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == structure_id)
    }

    pub fn get_structure_mut(&mut self, structure_id: &str) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == structure_id)
    }

    /// The living troop on a hex, if any.
    pub fn troop_at(&self, pos: Coord) -> Option<&Troop> {
        self.troops.iter().find(|t| t.hex == pos && t.is_alive())
    }

    pub fn structure_at(&self, pos: Coord) -> Option<&Structure> {
        self.structures.iter().find(|s| s.hex == pos)
    }

    /// All living troops belonging to a player.
    pub fn player_troops(&self, player_id: &str) -> Vec<&Troop> {
        self.troops.iter().filter(|t| t.owner_id == player_id && t.is_alive()).collect()
    }

    /// The player's HQ, if they still hold one.
    pub fn player_hq(&self, player_id: &str) -> Option<&Structure> {
        self.structures
            .iter()
            .find(|s| s.kind == StructureKind::Hq && s.is_owned_by(player_id))
    }

    pub fn add_troop(&mut self, troop: Troop) {
        self.troops.push(troop);
    }

    pub fn remove_troop(&mut self, unit_id: &str) {
        self.troops.retain(|t| t.id != unit_id);
    }

    pub fn add_structure(&mut self, structure: Structure) {
        self.structures.push(structure);
    }

    pub fn terrain_at(&self, pos: Coord) -> TerrainKind {
        self.terrain.get(pos)
    }

    /// In bounds and passable terrain.
    pub fn is_hex_passable(&self, balance: &Balance, pos: Coord) -> bool {
        self.grid.contains(pos) && balance.is_passable(self.terrain_at(pos))
    }

    pub fn is_hex_occupied_by_enemy(&self, pos: Coord, player_id: &str) -> bool {
        self.troop_at(pos).is_some_and(|t| t.owner_id != player_id)
    }

    pub fn switch_active_player(&mut self) {
        self.active_player = 1 - self.active_player;
    }

    pub fn structure_count_owned_by(&self, player_id: &str) -> usize {
        self.structures.iter().filter(|s| s.is_owned_by(player_id)).count()
    }

    pub fn total_structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Serializes for persistence and for the `game_state` wire message.
    pub fn serialize(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Restores a state from snapshot bytes, rebuilding the grid.
    pub fn deserialize(data: &[u8]) -> Result<GameState, serde_json::Error> {
        let mut gs: GameState = serde_json::from_slice(data)?;
        gs.grid = Grid::new(gs.map_size.radius());
        Ok(gs)
    }
}
