use uuid::Uuid;

use crate::config::Balance;
use crate::dice::Roller;
use crate::hex::Coord;
use crate::model::{ErrorCode, GamePhase, Structure, StructureKind, Troop, TroopKind};

use crate::server::messages::{
    Delta, ErrorData, GameOverData, TroopMovedData, TroopPurchasedData,
};

use super::combat::{resolve_structure_attack, resolve_troop_combat};
use super::economy::deduct_cost;
use super::pathfinding::can_reach;
use super::state::GameState;
use super::turn::run_turn_start;
use super::validate::{validate_attack, validate_buy, validate_end_turn, validate_move};
use super::win::check_win_conditions;

/// Output of processing one player action.
#[derive(Debug, Default)]
pub struct ActionResult {
    /// True if the action was accepted and applied.
    pub ack: bool,
    /// Set if the action was rejected; state is untouched in that case.
    pub error: Option<ErrorData>,
    /// Deltas to broadcast, in order, as one contiguous block.
    pub deltas: Vec<Delta>,
    /// Set if the game ended as a result of the action.
    pub game_over: Option<GameOverData>,
}

impl ActionResult {
    fn rejected(error: ErrorData) -> Self {
        ActionResult { ack: false, error: Some(error), ..Default::default() }
    }
}

/// Builds a troop with stats from the balance catalog. A troop cannot act on
/// its purchase turn.
pub fn new_troop(
    balance: &Balance,
    id: impl Into<String>,
    kind: TroopKind,
    owner_id: &str,
    pos: Coord,
) -> Result<Troop, String> {
    let tc = balance
        .troop_config(kind)
        .ok_or_else(|| format!("unknown troop type: {}", kind.as_str()))?;
    Ok(Troop {
        id: id.into(),
        kind,
        owner_id: owner_id.to_string(),
        hex: pos,
        current_hp: tc.hp,
        max_hp: tc.hp,
        atk: tc.atk,
        def: tc.def,
        mobility: tc.mobility,
        range: tc.range,
        damage: tc.damage.clone(),
        is_ready: false,
        has_moved: false,
        has_attacked: false,
        was_in_combat: false,
        remaining_mobility: tc.mobility,
    })
}

/// Builds a structure with stats from the balance catalog.
pub fn new_structure(
    balance: &Balance,
    id: impl Into<String>,
    kind: StructureKind,
    owner_id: &str,
    pos: Coord,
) -> Result<Structure, String> {
    let sc = balance
        .structure_config(kind)
        .ok_or_else(|| format!("unknown structure type: {}", kind.as_str()))?;
    Ok(Structure {
        id: id.into(),
        kind,
        owner_id: owner_id.to_string(),
        hex: pos,
        current_hp: sc.hp,
        max_hp: sc.hp,
        atk: sc.atk,
        def: sc.def,
        range: sc.range,
        damage: sc.damage.clone(),
        income: sc.income,
        can_spawn: sc.spawn,
    })
}

/// Processes a move action: validate, pay the movement cost, relocate.
pub fn execute_move(
    gs: &mut GameState,
    balance: &Balance,
    player_id: &str,
    unit_id: &str,
    target: Coord,
) -> ActionResult {
    if let Err(error) = validate_move(gs, balance, player_id, unit_id, target) {
        return ActionResult::rejected(error);
    }

    // Validation guarantees the troop exists and the target is reachable.
    let cost = {
        let troop = gs.get_troop(unit_id).expect("validated troop");
        can_reach(gs, balance, troop, target).expect("validated reachability")
    };

    let troop = gs.get_troop_mut(unit_id).expect("validated troop");
    let from = troop.hex;
    troop.hex = target;
    troop.remaining_mobility -= cost;
    troop.has_moved = true;
    let remaining_mobility = troop.remaining_mobility;

    ActionResult {
        ack: true,
        error: None,
        deltas: vec![Delta::TroopMoved(TroopMovedData {
            unit_id: unit_id.to_string(),
            from_q: from.q,
            from_r: from.r,
            from_s: from.s,
            to_q: target.q,
            to_r: target.r,
            to_s: target.s,
            remaining_mobility,
        })],
        game_over: None,
    }
}

/// Processes an attack action against a troop or a structure. Attacking ends
/// the unit's move phase regardless of remaining mobility.
pub fn execute_attack(
    gs: &mut GameState,
    balance: &Balance,
    roller: &mut Roller,
    player_id: &str,
    unit_id: &str,
    target: Coord,
) -> ActionResult {
    if let Err(error) = validate_attack(gs, player_id, unit_id, target) {
        return ActionResult::rejected(error);
    }

    {
        let attacker = gs.get_troop_mut(unit_id).expect("validated troop");
        attacker.has_attacked = true;
        attacker.has_moved = true;
    }
    let attacker_idx = gs.player_index(player_id);
    let mut deltas = Vec::new();

    if let Some(enemy) = gs.troop_at(target) {
        let enemy_id = enemy.id.clone();
        let enemy_owner = enemy.owner_id.clone();
        let defender_idx = gs.player_index(&enemy_owner);

        let (combat, destroyed) =
            resolve_troop_combat(gs, balance, roller, unit_id, &enemy_id);

        if combat.hit {
            if let Some(i) = attacker_idx {
                gs.stats[i].total_damage_dealt += combat.damage;
            }
        }
        deltas.push(Delta::CombatResult(combat));

        for d in destroyed {
            if d.unit_id == enemy_id {
                if let Some(i) = attacker_idx {
                    gs.stats[i].troops_killed += 1;
                }
                if let Some(i) = defender_idx {
                    gs.stats[i].troops_lost += 1;
                }
            } else {
                if let Some(i) = defender_idx {
                    gs.stats[i].troops_killed += 1;
                }
                if let Some(i) = attacker_idx {
                    gs.stats[i].troops_lost += 1;
                }
            }
            gs.remove_troop(&d.unit_id);
            deltas.push(Delta::TroopDestroyed(d));
        }
    } else if let Some(structure) = gs.structure_at(target) {
        let structure_id = structure.id.clone();
        let result = resolve_structure_attack(gs, balance, roller, unit_id, &structure_id);
        if result.damage > 0 {
            if let Some(i) = attacker_idx {
                gs.stats[i].total_damage_dealt += result.damage;
            }
        }
        deltas.push(Delta::StructureAttacked(result));
    }

    // Attacks can only end the game through HQ loss.
    let game_over = check_win_conditions(gs, balance, false);
    ActionResult { ack: true, error: None, deltas, game_over }
}

/// Processes a buy action: validate, pick a spawn hex around the structure,
/// deduct cost, create the troop unready.
pub fn execute_buy(
    gs: &mut GameState,
    balance: &Balance,
    player_id: &str,
    troop_kind: TroopKind,
    structure_id: &str,
) -> ActionResult {
    if let Err(error) = validate_buy(gs, balance, player_id, troop_kind, structure_id) {
        return ActionResult::rejected(error);
    }

    let spawner_hex = gs.get_structure(structure_id).expect("validated structure").hex;
    let Some(spawn_hex) = find_spawn_hex(gs, balance, spawner_hex) else {
        return ActionResult::rejected(ErrorData::new(
            ErrorCode::SpawnOccupied,
            "no free hex around structure",
        ));
    };

    deduct_cost(gs, balance, player_id, troop_kind);

    let unit_id = Uuid::new_v4().to_string();
    let troop = match new_troop(balance, unit_id.clone(), troop_kind, player_id, spawn_hex) {
        Ok(t) => t,
        Err(message) => {
            return ActionResult::rejected(ErrorData::new(ErrorCode::InvalidMessage, message));
        }
    };
    gs.add_troop(troop);

    let coins_remaining = gs.player_index(player_id).map_or(0, |i| gs.players[i].coins);

    ActionResult {
        ack: true,
        error: None,
        deltas: vec![Delta::TroopPurchased(TroopPurchasedData {
            unit_id,
            unit_type: troop_kind,
            hex_q: spawn_hex.q,
            hex_r: spawn_hex.r,
            hex_s: spawn_hex.s,
            owner: player_id.to_string(),
            coins_remaining,
        })],
        game_over: None,
    }
}

/// First in-grid passable hex with no troop and no other structure, searching
/// rings 0..=3 around the spawner.
fn find_spawn_hex(gs: &GameState, balance: &Balance, spawner: Coord) -> Option<Coord> {
    for radius in 0..=3 {
        for hex in spawner.ring(radius) {
            if gs.is_hex_passable(balance, hex)
                && gs.troop_at(hex).is_none()
                && gs.structure_at(hex).is_none()
            {
                return Some(hex);
            }
        }
    }
    None
}

/// Processes an end-turn action: win check for the leaving player, player
/// switch, turn-start pipeline, win check for the entering player.
pub fn execute_end_turn(
    gs: &mut GameState,
    balance: &Balance,
    player_id: &str,
) -> ActionResult {
    if let Err(error) = validate_end_turn(gs, player_id) {
        return ActionResult::rejected(error);
    }

    gs.phase = GamePhase::TurnTransition;

    // End-of-turn evaluation advances dominance counters.
    if let Some(game_over) = check_win_conditions(gs, balance, true) {
        return ActionResult { ack: true, error: None, deltas: Vec::new(), game_over: Some(game_over) };
    }

    gs.switch_active_player();
    gs.turn_number += 1;

    let turn_start = run_turn_start(gs, balance);

    // Sudden death may have killed something decisive.
    let game_over = check_win_conditions(gs, balance, false);

    ActionResult {
        ack: true,
        error: None,
        deltas: vec![Delta::TurnStart(turn_start)],
        game_over,
    }
}
