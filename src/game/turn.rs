use crate::config::Balance;
use crate::model::GamePhase;
use crate::server::messages::{HealedUnit, StructureRegen, TurnStartData};

use super::economy::{calculate_income, credit_income};
use super::state::GameState;
use super::sudden_death::run_sudden_death_phase;

/// Runs the turn-start pipeline for the newly active player and returns the
/// `turn_start` delta. Order matters:
/// sudden death, passive healing, structure regen, income, readiness,
/// per-turn reset.
pub fn run_turn_start(gs: &mut GameState, balance: &Balance) -> TurnStartData {
    gs.phase = GamePhase::TurnStart;
    let active_id = gs.active_player_id().to_string();

    // 1. Sudden death may shrink the zone and damage or kill troops.
    let (sudden_death_damage, _relocations) = run_sudden_death_phase(gs, balance);

    // 2. Passive healing for troops that stayed out of combat last turn.
    let healing_rate = balance.healing_rate();
    let mut healed_units = Vec::new();
    for troop in gs.troops.iter_mut() {
        if troop.owner_id == active_id && troop.is_alive() && !troop.was_in_combat {
            let before = troop.current_hp;
            if troop.heal(healing_rate) > 0 {
                healed_units.push(HealedUnit {
                    unit_id: troop.id.clone(),
                    hp_before: before,
                    hp_after: troop.current_hp,
                });
            }
        }
    }

    // 3. Structure regen for the active player's structures.
    let mut structure_regens = Vec::new();
    for structure in gs.structures.iter_mut() {
        if structure.is_owned_by(&active_id) && structure.is_alive() {
            let before = structure.current_hp;
            if structure.heal(healing_rate) > 0 {
                structure_regens.push(StructureRegen {
                    structure_id: structure.id.clone(),
                    hp_before: before,
                    hp_after: structure.current_hp,
                });
            }
        }
    }

    // 4. Income.
    let (_, structure_income, income_gained) = calculate_income(gs, balance, &active_id);
    credit_income(gs, balance, &active_id);

    // 5-6. Troops purchased last turn become ready; per-turn flags reset.
    for troop in gs.troops.iter_mut() {
        if troop.owner_id == active_id {
            if !troop.is_ready {
                troop.is_ready = true;
            }
            troop.reset_for_turn();
        }
    }

    let total_coins = gs.player_index(&active_id).map_or(0, |i| gs.players[i].coins);

    TurnStartData {
        turn_number: gs.turn_number,
        active_player_id: active_id,
        timer_seconds: gs.turn_timer,
        income_gained,
        structure_income,
        total_coins,
        healed_units,
        structure_regens,
        sudden_death_damage,
    }
}
