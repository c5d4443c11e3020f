use crate::config::Balance;
use crate::hex::Coord;
use crate::model::{ErrorCode, GamePhase, TroopKind};
use crate::server::messages::ErrorData;

use super::pathfinding::{can_attack_target, can_reach};
use super::state::GameState;

fn require_turn(gs: &GameState, player_id: &str) -> Result<(), ErrorData> {
    if !gs.is_active_player(player_id) {
        return Err(ErrorData::new(ErrorCode::NotYourTurn, "it is not your turn"));
    }
    if gs.phase != GamePhase::PlayerAction {
        return Err(ErrorData::new(ErrorCode::NotYourTurn, "not in player action phase"));
    }
    Ok(())
}

/// Checks whether a move action is legal.
pub fn validate_move(
    gs: &GameState,
    balance: &Balance,
    player_id: &str,
    unit_id: &str,
    target: Coord,
) -> Result<(), ErrorData> {
    require_turn(gs, player_id)?;

    let troop = gs
        .get_troop(unit_id)
        .ok_or_else(|| ErrorData::new(ErrorCode::UnitNotFound, "unit not found"))?;

    if troop.owner_id != player_id {
        return Err(ErrorData::new(ErrorCode::UnitNotFound, "unit does not belong to you"));
    }
    if !troop.is_ready {
        return Err(ErrorData::new(
            ErrorCode::UnitNotReady,
            "unit was purchased this turn and cannot act",
        ));
    }
    if troop.has_moved {
        return Err(ErrorData::new(
            ErrorCode::UnitAlreadyActed,
            "unit has already moved this turn",
        ));
    }
    if !gs.grid.contains(target) {
        return Err(ErrorData::new(ErrorCode::InvalidMove, "target hex is out of bounds"));
    }
    if !gs.is_hex_passable(balance, target) {
        return Err(ErrorData::new(ErrorCode::InvalidMove, "target hex is impassable terrain"));
    }
    if gs.troop_at(target).is_some() {
        return Err(ErrorData::new(ErrorCode::InvalidMove, "target hex is occupied by a unit"));
    }
    if gs.structure_at(target).is_some() {
        return Err(ErrorData::new(
            ErrorCode::InvalidMove,
            "target hex is occupied by a structure",
        ));
    }
    if can_reach(gs, balance, troop, target).is_none() {
        return Err(ErrorData::new(
            ErrorCode::InvalidMove,
            "target hex is not reachable within mobility range",
        ));
    }

    Ok(())
}

/// Checks whether an attack action is legal.
pub fn validate_attack(
    gs: &GameState,
    player_id: &str,
    unit_id: &str,
    target: Coord,
) -> Result<(), ErrorData> {
    require_turn(gs, player_id)?;

    // Player 0 cannot attack on turn 1.
    if gs.first_turn_restriction && gs.turn_number == 1 && gs.active_player == 0 {
        return Err(ErrorData::new(ErrorCode::InvalidAttack, "cannot attack on the first turn"));
    }

    let troop = gs
        .get_troop(unit_id)
        .ok_or_else(|| ErrorData::new(ErrorCode::UnitNotFound, "unit not found"))?;

    if troop.owner_id != player_id {
        return Err(ErrorData::new(ErrorCode::UnitNotFound, "unit does not belong to you"));
    }
    if !troop.is_ready {
        return Err(ErrorData::new(
            ErrorCode::UnitNotReady,
            "unit was purchased this turn and cannot act",
        ));
    }
    if troop.has_attacked {
        return Err(ErrorData::new(
            ErrorCode::UnitAlreadyActed,
            "unit has already attacked this turn",
        ));
    }
    if !can_attack_target(troop, target) {
        return Err(ErrorData::new(ErrorCode::InvalidAttack, "target is out of attack range"));
    }

    let enemy_troop = gs.troop_at(target);
    let structure = gs.structure_at(target);

    if enemy_troop.is_none() && structure.is_none() {
        return Err(ErrorData::new(ErrorCode::InvalidAttack, "no target at hex"));
    }
    if let Some(t) = enemy_troop {
        if t.owner_id == player_id {
            return Err(ErrorData::new(ErrorCode::InvalidAttack, "cannot attack your own unit"));
        }
    } else if let Some(s) = structure {
        if s.is_owned_by(player_id) {
            return Err(ErrorData::new(
                ErrorCode::InvalidAttack,
                "cannot attack your own structure",
            ));
        }
    }

    Ok(())
}

/// Checks whether a buy action is legal.
pub fn validate_buy(
    gs: &GameState,
    balance: &Balance,
    player_id: &str,
    troop_kind: TroopKind,
    structure_id: &str,
) -> Result<(), ErrorData> {
    require_turn(gs, player_id)?;
    super::economy::validate_purchase(gs, balance, player_id, troop_kind, structure_id)
}

/// Checks whether ending the turn is legal.
pub fn validate_end_turn(gs: &GameState, player_id: &str) -> Result<(), ErrorData> {
    require_turn(gs, player_id)
}
