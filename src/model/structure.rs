use serde::{Deserialize, Serialize};

use crate::hex::Coord;
use super::StructureKind;

/// A capturable building on the map. An empty owner means neutral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub id: String,
    pub kind: StructureKind,
    pub owner_id: String,
    pub hex: Coord,
    pub current_hp: i32,
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub range: i32,
    /// Damage dice notation.
    pub damage: String,
    pub income: i32,
    pub can_spawn: bool,
}

impl Structure {
    pub fn is_neutral(&self) -> bool {
        self.owner_id.is_empty()
    }

    pub fn is_owned_by(&self, player_id: &str) -> bool {
        self.owner_id == player_id
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Applies damage, clamping HP at 0. Returns true if HP reached 0.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.current_hp = (self.current_hp - amount).max(0);
        self.current_hp == 0
    }

    /// Transfers ownership and restores HP to max. Capture is the only way a
    /// structure changes hands; structures are never destroyed.
    pub fn capture(&mut self, new_owner_id: &str) {
        self.owner_id = new_owner_id.to_string();
        self.current_hp = self.max_hp;
    }

    /// Restores HP up to max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.current_hp;
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
        self.current_hp - before
    }
}
