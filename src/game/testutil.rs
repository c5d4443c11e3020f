//! Test helpers: a canned balance catalog and a builder for game states.

use std::collections::HashMap;

use crate::config::{
    Balance, EconomyConfig, HealingConfig, MapGenConfig, MatchmakingConfig, NeutralModifiers,
    StructureConfig, SuddenDeathConfig, TerrainOverride, TroopConfig, WinConditions,
};
use crate::hex::Coord;
use crate::model::{
    GamePhase, MapSize, PlayerState, RoomSettings, StructureKind, TerrainKind, TroopKind, TurnMode,
};

use super::state::GameState;

/// A balance catalog with the standard tuning values, built without touching
/// the filesystem.
pub fn test_balance() -> Balance {
    let mut troops = HashMap::new();
    troops.insert(
        "marine".to_string(),
        TroopConfig { cost: 100, hp: 10, atk: 3, def: 14, mobility: 3, range: 1, damage: "1D6+1".into(), anti_structure_multiplier: 0 },
    );
    troops.insert(
        "sniper".to_string(),
        TroopConfig { cost: 150, hp: 6, atk: 4, def: 11, mobility: 2, range: 3, damage: "1D8".into(), anti_structure_multiplier: 0 },
    );
    troops.insert(
        "hoverbike".to_string(),
        TroopConfig { cost: 200, hp: 8, atk: 4, def: 12, mobility: 5, range: 1, damage: "1D8+1".into(), anti_structure_multiplier: 0 },
    );
    troops.insert(
        "mech".to_string(),
        TroopConfig { cost: 350, hp: 12, atk: 5, def: 10, mobility: 1, range: 3, damage: "2D6+2".into(), anti_structure_multiplier: 2 },
    );

    let mut structures = HashMap::new();
    structures.insert(
        "outpost".to_string(),
        StructureConfig { hp: 8, atk: 2, def: 12, range: 2, damage: "1D4".into(), income: 50, spawn: true },
    );
    structures.insert(
        "command_center".to_string(),
        StructureConfig { hp: 15, atk: 4, def: 15, range: 3, damage: "1D6+2".into(), income: 50, spawn: true },
    );
    structures.insert(
        "hq".to_string(),
        StructureConfig { hp: 20, atk: 3, def: 16, range: 2, damage: "1D6".into(), income: 0, spawn: true },
    );

    let mut terrain = HashMap::new();
    terrain.insert(
        "water".to_string(),
        TerrainOverride { passable: Some(false), ..Default::default() },
    );
    terrain.insert(
        "mountains".to_string(),
        TerrainOverride { passable: Some(false), ..Default::default() },
    );

    let mut turn_thresholds = HashMap::new();
    turn_thresholds.insert("small".to_string(), 20);
    turn_thresholds.insert("medium".to_string(), 30);
    turn_thresholds.insert("large".to_string(), 40);

    let mut noise_thresholds = HashMap::new();
    noise_thresholds.insert("water".to_string(), 0.15);
    noise_thresholds.insert("plains".to_string(), 0.55);
    noise_thresholds.insert("forest".to_string(), 0.75);
    noise_thresholds.insert("hills".to_string(), 0.88);

    let mut structure_counts = HashMap::new();
    structure_counts.insert("small".to_string(), 5);
    structure_counts.insert("medium".to_string(), 7);
    structure_counts.insert("large".to_string(), 9);

    Balance {
        economy: EconomyConfig { starting_coins: 1000, passive_income: 100, structure_income: 50 },
        troops,
        structures,
        neutral_modifiers: NeutralModifiers { atk_reduction: 2, damage_step_down: 1 },
        terrain,
        healing: HealingConfig { passive_rate: 2 },
        sudden_death: SuddenDeathConfig { turn_thresholds, shrink_rate: 1 },
        map_generation: MapGenConfig {
            noise_thresholds,
            structure_counts,
            min_passable_ratio: 0.60,
            max_retries: 10,
        },
        matchmaking: MatchmakingConfig::default(),
        win_conditions: WinConditions { dominance_turns_required: 3 },
    }
}

/// Builder for game states in tests. Defaults: small all-plains map, players
/// "p1"/"p2", turn 1, player-action phase, first-turn restriction off.
pub struct TestGame {
    balance: Balance,
    state: GameState,
}

impl TestGame {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let balance = test_balance();
        let settings = RoomSettings {
            map_size: MapSize::Small,
            turn_timer: 90,
            turn_mode: TurnMode::Alternating,
        };
        let p1 = PlayerState::new("p1", "Player1");
        let p2 = PlayerState::new("p2", "Player2");
        let mut state = GameState::new("test_game", settings, p1, p2, 42, &balance);
        state.phase = GamePhase::PlayerAction;
        state.turn_number = 1;
        state.first_turn_restriction = false;
        TestGame { balance, state }
    }

    pub fn with_map_size(mut self, size: MapSize) -> Self {
        self.state.map_size = size;
        self.state.grid = crate::hex::Grid::new(size.radius());
        self.state.safe_zone_radius = size.radius();
        self
    }

    pub fn with_troop(mut self, owner: &str, kind: TroopKind, pos: Coord, ready: bool) -> Self {
        let id = format!("unit_{}_{}_{}", pos.q, pos.r, pos.s);
        let mut troop = super::actions::new_troop(&self.balance, id, kind, owner, pos)
            .expect("known troop type");
        troop.is_ready = ready;
        self.state.add_troop(troop);
        self
    }

    pub fn with_structure(mut self, kind: StructureKind, owner: &str, pos: Coord) -> Self {
        let id = format!("struct_{}_{}_{}", pos.q, pos.r, pos.s);
        let structure = super::actions::new_structure(&self.balance, id, kind, owner, pos)
            .expect("known structure type");
        self.state.add_structure(structure);
        self
    }

    pub fn with_terrain(mut self, pos: Coord, kind: TerrainKind) -> Self {
        self.state.terrain.set(pos, kind);
        self
    }

    pub fn with_coins(mut self, player_id: &str, coins: i32) -> Self {
        if let Some(idx) = self.state.player_index(player_id) {
            self.state.players[idx].coins = coins;
        }
        self
    }

    pub fn with_turn(mut self, turn: u32) -> Self {
        self.state.turn_number = turn;
        self
    }

    pub fn with_active_player(mut self, player_id: &str) -> Self {
        self.state.active_player = if self.state.players[1].id == player_id { 1 } else { 0 };
        self
    }

    pub fn with_first_turn_restriction(mut self, on: bool) -> Self {
        self.state.first_turn_restriction = on;
        self
    }

    pub fn balance(&self) -> Balance {
        self.balance.clone()
    }

    /// Finishes the build, filling unset terrain with plains.
    pub fn build(self) -> GameState {
        let mut state = self.state;
        for c in state.grid.all_hexes() {
            if !state.terrain.raw().contains_key(&c) {
                state.terrain.set(c, TerrainKind::Plains);
            }
        }
        state
    }

    /// Build plus the balance, for call sites needing both.
    pub fn build_with_balance(self) -> (GameState, Balance) {
        let balance = self.balance.clone();
        (self.build(), balance)
    }
}
