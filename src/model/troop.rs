use serde::{Deserialize, Serialize};

use crate::hex::Coord;
use super::TroopKind;

/// A single unit on the battlefield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Troop {
    pub id: String,
    pub kind: TroopKind,
    pub owner_id: String,
    pub hex: Coord,
    pub current_hp: i32,
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub mobility: i32,
    pub range: i32,
    /// Damage dice notation, e.g. "1D6+1".
    pub damage: String,
    /// False on the turn the troop was purchased.
    pub is_ready: bool,
    pub has_moved: bool,
    pub has_attacked: bool,
    pub was_in_combat: bool,
    pub remaining_mobility: i32,
}

impl Troop {
    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn can_act(&self) -> bool {
        self.is_alive() && self.is_ready
    }

    pub fn can_move(&self) -> bool {
        self.can_act() && !self.has_moved && self.remaining_mobility > 0
    }

    pub fn can_attack(&self) -> bool {
        self.can_act() && !self.has_attacked
    }

    /// Resets per-turn action flags and restores mobility.
    pub fn reset_for_turn(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
        self.was_in_combat = false;
        self.remaining_mobility = self.mobility;
    }

    /// Applies damage, clamping HP at 0. Returns true if the troop died.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.current_hp = (self.current_hp - amount).max(0);
        self.current_hp == 0
    }

    /// Restores HP up to max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.current_hp;
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
        self.current_hp - before
    }

    pub fn is_melee(&self) -> bool {
        self.range == 1
    }
}
