//! The authoritative per-game core: state, movement, combat, validators,
//! executors, economy, sudden death, win conditions, and the turn pipeline.

mod actions;
mod combat;
mod economy;
mod pathfinding;
mod state;
mod sudden_death;
mod turn;
mod validate;
mod win;

#[cfg(test)]
pub mod testutil;

pub use actions::{
    execute_attack, execute_buy, execute_end_turn, execute_move, new_structure, new_troop,
    ActionResult,
};
pub use combat::{find_structure_target, resolve_structure_attack, resolve_structure_fire, resolve_troop_combat};
pub use economy::{calculate_income, credit_income, deduct_cost, validate_purchase};
pub use pathfinding::{can_attack_target, can_reach, reachable_hexes};
pub use state::GameState;
pub(crate) use state::now_unix;
pub use sudden_death::{run_sudden_death_phase, HqRelocation};
pub use turn::run_turn_start;
pub use validate::{validate_attack, validate_buy, validate_end_turn, validate_move};
pub use win::{check_disconnect_forfeit, check_forfeit, check_win_conditions};
