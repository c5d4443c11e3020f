use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

use crate::model::{MapSize, RoomSettings, StructureKind, TerrainInfo, TerrainKind, TroopKind, TurnMode};

/// All game balance constants, loaded once at startup from a TOML document
/// and injected into the engines as a read-only handle.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub economy: EconomyConfig,
    pub troops: HashMap<String, TroopConfig>,
    pub structures: HashMap<String, StructureConfig>,
    pub neutral_modifiers: NeutralModifiers,
    #[serde(default)]
    pub terrain: HashMap<String, TerrainOverride>,
    pub healing: HealingConfig,
    pub sudden_death: SuddenDeathConfig,
    pub map_generation: MapGenConfig,
    #[serde(default)]
    pub matchmaking: MatchmakingConfig,
    pub win_conditions: WinConditions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EconomyConfig {
    pub starting_coins: i32,
    pub passive_income: i32,
    pub structure_income: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TroopConfig {
    pub cost: i32,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub mobility: i32,
    pub range: i32,
    pub damage: String,
    #[serde(default)]
    pub anti_structure_multiplier: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructureConfig {
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub range: i32,
    pub damage: String,
    pub income: i32,
    pub spawn: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeutralModifiers {
    pub atk_reduction: i32,
    pub damage_step_down: u32,
}

/// Per-field overrides over the built-in terrain table.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TerrainOverride {
    pub movement_cost: Option<i32>,
    pub atk_modifier: Option<i32>,
    pub def_modifier: Option<i32>,
    pub passable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealingConfig {
    pub passive_rate: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuddenDeathConfig {
    pub turn_thresholds: HashMap<String, u32>,
    pub shrink_rate: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapGenConfig {
    pub noise_thresholds: HashMap<String, f64>,
    pub structure_counts: HashMap<String, usize>,
    pub min_passable_ratio: f64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchmakingConfig {
    pub quick_match_defaults: QuickMatchDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickMatchDefaults {
    pub map_size: String,
    pub turn_timer: u32,
    pub turn_mode: String,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        MatchmakingConfig {
            quick_match_defaults: QuickMatchDefaults {
                map_size: "medium".to_string(),
                turn_timer: 90,
                turn_mode: "alternating".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WinConditions {
    pub dominance_turns_required: u32,
}

impl Balance {
    /// Reads and parses the balance document.
    pub fn load(path: &str) -> Result<Balance, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read balance file {path}: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse balance file {path}: {e}"))
    }

    pub fn troop_config(&self, kind: TroopKind) -> Option<&TroopConfig> {
        self.troops.get(kind.as_str())
    }

    /// Coin cost for a troop type; 0 for unknown types.
    pub fn troop_cost(&self, kind: TroopKind) -> i32 {
        self.troop_config(kind).map_or(0, |tc| tc.cost)
    }

    /// Damage multiplier a troop gets against structures, at least 1.
    pub fn anti_structure_multiplier(&self, kind: TroopKind) -> i32 {
        self.troop_config(kind)
            .map_or(1, |tc| tc.anti_structure_multiplier.max(1))
    }

    pub fn structure_config(&self, kind: StructureKind) -> Option<&StructureConfig> {
        self.structures.get(kind.as_str())
    }

    /// Terrain properties: the built-in table with any per-field overrides
    /// from the catalog applied.
    pub fn terrain_info(&self, kind: TerrainKind) -> TerrainInfo {
        let mut info = kind.default_info();
        if let Some(over) = self.terrain.get(kind.as_str()) {
            if let Some(mc) = over.movement_cost {
                info.movement_cost = mc;
            }
            if let Some(atk) = over.atk_modifier {
                info.atk_modifier = atk;
            }
            if let Some(def) = over.def_modifier {
                info.def_modifier = def;
            }
            if let Some(passable) = over.passable {
                info.passable = passable;
            }
        }
        info
    }

    pub fn is_passable(&self, kind: TerrainKind) -> bool {
        self.terrain_info(kind).passable
    }

    pub fn movement_cost(&self, kind: TerrainKind) -> i32 {
        self.terrain_info(kind).movement_cost
    }

    pub fn starting_coins(&self) -> i32 {
        self.economy.starting_coins
    }

    pub fn passive_income(&self) -> i32 {
        self.economy.passive_income
    }

    pub fn structure_income(&self) -> i32 {
        self.economy.structure_income
    }

    pub fn healing_rate(&self) -> i32 {
        self.healing.passive_rate
    }

    /// Turn number past which sudden death activates for the map size.
    pub fn sudden_death_threshold(&self, size: MapSize) -> u32 {
        self.sudden_death
            .turn_thresholds
            .get(size.as_str())
            .copied()
            .unwrap_or(match size {
                MapSize::Small => 20,
                MapSize::Medium => 30,
                MapSize::Large => 40,
            })
    }

    pub fn shrink_rate(&self) -> i32 {
        self.sudden_death.shrink_rate
    }

    pub fn dominance_turns_required(&self) -> u32 {
        self.win_conditions.dominance_turns_required
    }

    pub fn noise_threshold(&self, name: &str, default: f64) -> f64 {
        self.map_generation.noise_thresholds.get(name).copied().unwrap_or(default)
    }

    pub fn structure_count(&self, size: MapSize) -> usize {
        self.map_generation.structure_counts.get(size.as_str()).copied().unwrap_or(5)
    }

    /// Room settings for a quick match, from the matchmaking defaults.
    pub fn quick_match_settings(&self) -> RoomSettings {
        let defaults = &self.matchmaking.quick_match_defaults;
        RoomSettings {
            map_size: match defaults.map_size.as_str() {
                "small" => MapSize::Small,
                "large" => MapSize::Large,
                _ => MapSize::Medium,
            },
            turn_timer: defaults.turn_timer,
            turn_mode: match defaults.turn_mode.as_str() {
                "simultaneous" => TurnMode::Simultaneous,
                _ => TurnMode::Alternating,
            },
        }
    }
}
