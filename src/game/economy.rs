use crate::config::Balance;
use crate::model::{ErrorCode, StructureKind, TroopKind};
use crate::server::messages::ErrorData;

use super::state::GameState;

/// Income for the player this turn: (passive, structure, total). Outposts and
/// command centers yield the per-structure bonus; HQs yield nothing.
pub fn calculate_income(gs: &GameState, balance: &Balance, player_id: &str) -> (i32, i32, i32) {
    let passive = balance.passive_income();
    let owned_yielding = gs
        .structures
        .iter()
        .filter(|s| s.is_owned_by(player_id))
        .filter(|s| matches!(s.kind, StructureKind::Outpost | StructureKind::CommandCenter))
        .count() as i32;
    let structure_income = owned_yielding * balance.structure_income();
    (passive, structure_income, passive + structure_income)
}

/// Credits the calculated income to the player. Returns the total credited.
pub fn credit_income(gs: &mut GameState, balance: &Balance, player_id: &str) -> i32 {
    let (_, _, total) = calculate_income(gs, balance, player_id);
    if let Some(idx) = gs.player_index(player_id) {
        gs.players[idx].coins += total;
    }
    total
}

/// Checks whether a player can buy a troop at a structure.
pub fn validate_purchase(
    gs: &GameState,
    balance: &Balance,
    player_id: &str,
    troop_kind: TroopKind,
    structure_id: &str,
) -> Result<(), ErrorData> {
    let cost = balance.troop_cost(troop_kind);
    if cost == 0 {
        return Err(ErrorData::new(ErrorCode::InvalidMessage, "unknown troop type"));
    }

    let idx = gs
        .player_index(player_id)
        .ok_or_else(|| ErrorData::new(ErrorCode::InvalidMessage, "player not found"))?;

    if gs.players[idx].coins < cost {
        return Err(ErrorData::new(ErrorCode::InsufficientFunds, "not enough coins"));
    }

    let structure = gs
        .get_structure(structure_id)
        .ok_or_else(|| ErrorData::new(ErrorCode::InvalidMessage, "structure not found"))?;

    if !structure.is_owned_by(player_id) {
        return Err(ErrorData::new(ErrorCode::SpawnNotOwned, "structure not owned by player"));
    }
    if !structure.can_spawn {
        return Err(ErrorData::new(ErrorCode::SpawnNotOwned, "structure cannot spawn troops"));
    }
    if gs.troop_at(structure.hex).is_some() {
        return Err(ErrorData::new(ErrorCode::SpawnOccupied, "spawn hex is occupied"));
    }

    Ok(())
}

/// Subtracts the troop cost from the player's coins.
pub fn deduct_cost(gs: &mut GameState, balance: &Balance, player_id: &str, troop_kind: TroopKind) {
    let cost = balance.troop_cost(troop_kind);
    if let Some(idx) = gs.player_index(player_id) {
        gs.players[idx].coins -= cost;
    }
}
