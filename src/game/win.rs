use std::collections::HashMap;

use crate::config::Balance;
use crate::model::{GamePhase, WinReason};
use crate::server::messages::GameOverData;

use super::state::GameState;

/// Evaluates the win conditions in precedence order: HQ loss, then structure
/// dominance, then the sudden-death tiebreak. Returns None while the game
/// continues.
///
/// Dominance counters are only advanced on end-of-turn evaluations
/// (`end_of_turn` = true); evaluations after attacks and turn starts check
/// the other conditions against current state without touching the counters.
pub fn check_win_conditions(
    gs: &mut GameState,
    balance: &Balance,
    end_of_turn: bool,
) -> Option<GameOverData> {
    // 1. HQ loss: missing or no longer owned.
    for i in 0..2 {
        let player_id = gs.players[i].id.clone();
        if gs.player_hq(&player_id).is_none() {
            let winner = gs.players[1 - i].id.clone();
            return Some(build_game_over(gs, &winner, WinReason::HqDestroyed));
        }
    }

    // 2. Structure dominance, advanced only at end of turn.
    if end_of_turn {
        let total = gs.total_structure_count();
        for i in 0..2 {
            let player_id = gs.players[i].id.clone();
            let owned = gs.structure_count_owned_by(&player_id);
            if total > 0 && owned > total / 2 {
                gs.players[i].dominance_turn_counter += 1;
            } else {
                gs.players[i].dominance_turn_counter = 0;
            }
            if gs.players[i].dominance_turn_counter >= balance.dominance_turns_required() {
                return Some(build_game_over(gs, &player_id, WinReason::StructureDominance));
            }
        }
    }

    // 3. Sudden-death tiebreak once the zone has collapsed.
    if gs.sudden_death_active && gs.safe_zone_radius <= 1 {
        return Some(resolve_sudden_death_tiebreak(gs));
    }

    None
}

/// Winner when the zone is at minimum: more structures, then more total
/// living troop HP, then a draw.
fn resolve_sudden_death_tiebreak(gs: &mut GameState) -> GameOverData {
    let p1_id = gs.players[0].id.clone();
    let p2_id = gs.players[1].id.clone();

    let p1_structs = gs.structure_count_owned_by(&p1_id);
    let p2_structs = gs.structure_count_owned_by(&p2_id);
    if p1_structs != p2_structs {
        let winner = if p1_structs > p2_structs { p1_id } else { p2_id };
        return build_game_over(gs, &winner, WinReason::SuddenDeath);
    }

    let p1_hp = total_troop_hp(gs, &p1_id);
    let p2_hp = total_troop_hp(gs, &p2_id);
    if p1_hp != p2_hp {
        let winner = if p1_hp > p2_hp { p1_id } else { p2_id };
        return build_game_over(gs, &winner, WinReason::SuddenDeath);
    }

    build_game_over(gs, "", WinReason::Draw)
}

fn total_troop_hp(gs: &GameState, player_id: &str) -> i32 {
    gs.troops
        .iter()
        .filter(|t| t.owner_id == player_id && t.is_alive())
        .map(|t| t.current_hp)
        .sum()
}

/// Explicit surrender: the other player wins.
pub fn check_forfeit(gs: &mut GameState, loser_id: &str) -> GameOverData {
    let winner_idx = gs.player_index(loser_id).map(|i| 1 - i).unwrap_or(0);
    let winner = gs.players[winner_idx].id.clone();
    build_game_over(gs, &winner, WinReason::Forfeit)
}

/// Reconnect window expired: the other player wins.
pub fn check_disconnect_forfeit(gs: &mut GameState, disconnected_id: &str) -> GameOverData {
    let winner_idx = gs.player_index(disconnected_id).map(|i| 1 - i).unwrap_or(0);
    let winner = gs.players[winner_idx].id.clone();
    build_game_over(gs, &winner, WinReason::Disconnect)
}

/// Moves the game to its terminal phase and finalizes per-player stats.
fn build_game_over(gs: &mut GameState, winner_id: &str, reason: WinReason) -> GameOverData {
    gs.phase = GamePhase::GameOver;

    for i in 0..2 {
        let player_id = gs.players[i].id.clone();
        gs.stats[i].turns_played = gs.turn_number;
        gs.stats[i].structures_held = gs.structure_count_owned_by(&player_id) as u32;
    }

    let mut stats = HashMap::new();
    stats.insert(gs.players[0].id.clone(), gs.stats[0]);
    stats.insert(gs.players[1].id.clone(), gs.stats[1]);

    GameOverData { winner_id: winner_id.to_string(), reason, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testutil::TestGame;
    use crate::hex::Coord;
    use crate::model::{StructureKind, TroopKind};

    #[test]
    fn hq_loss_ends_the_game() {
        let (mut gs, balance) = TestGame::new()
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .build_with_balance();
        // p2 has no HQ at all.
        let over = check_win_conditions(&mut gs, &balance, false).unwrap();
        assert_eq!(over.winner_id, "p1");
        assert_eq!(over.reason, WinReason::HqDestroyed);
        assert_eq!(gs.phase, GamePhase::GameOver);
    }

    #[test]
    fn captured_hq_counts_as_lost() {
        let (mut gs, balance) = TestGame::new()
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .with_structure(StructureKind::Hq, "p2", Coord::new(0, 7, -7))
            .build_with_balance();
        let hq2 = gs.structure_at(Coord::new(0, 7, -7)).unwrap().id.clone();
        gs.get_structure_mut(&hq2).unwrap().capture("p1");

        let over = check_win_conditions(&mut gs, &balance, false).unwrap();
        assert_eq!(over.winner_id, "p1");
        assert_eq!(over.reason, WinReason::HqDestroyed);
    }

    #[test]
    fn dominance_counter_advances_only_at_end_of_turn() {
        let (mut gs, balance) = TestGame::new()
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .with_structure(StructureKind::Hq, "p2", Coord::new(0, 7, -7))
            .with_structure(StructureKind::Outpost, "p1", Coord::new(2, -2, 0))
            .with_structure(StructureKind::Outpost, "p1", Coord::new(-2, 2, 0))
            .build_with_balance();

        // p1 owns 3 of 4 structures. Non-end-of-turn evaluations leave the
        // counter untouched.
        assert!(check_win_conditions(&mut gs, &balance, false).is_none());
        assert_eq!(gs.players[0].dominance_turn_counter, 0);

        assert!(check_win_conditions(&mut gs, &balance, true).is_none());
        assert!(check_win_conditions(&mut gs, &balance, true).is_none());
        assert_eq!(gs.players[0].dominance_turn_counter, 2);

        let over = check_win_conditions(&mut gs, &balance, true).unwrap();
        assert_eq!(over.winner_id, "p1");
        assert_eq!(over.reason, WinReason::StructureDominance);
    }

    #[test]
    fn dominance_counter_resets_when_majority_lost() {
        let (mut gs, balance) = TestGame::new()
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .with_structure(StructureKind::Hq, "p2", Coord::new(0, 7, -7))
            .with_structure(StructureKind::Outpost, "p1", Coord::new(2, -2, 0))
            .build_with_balance();

        assert!(check_win_conditions(&mut gs, &balance, true).is_none());
        assert_eq!(gs.players[0].dominance_turn_counter, 1);

        // p1 drops to exactly half: strict majority is gone.
        let outpost = gs.structure_at(Coord::new(2, -2, 0)).unwrap().id.clone();
        gs.get_structure_mut(&outpost).unwrap().capture("p2");
        assert!(check_win_conditions(&mut gs, &balance, true).is_none());
        assert_eq!(gs.players[0].dominance_turn_counter, 0);
    }

    #[test]
    fn hq_loss_beats_dominance() {
        let (mut gs, balance) = TestGame::new()
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .with_structure(StructureKind::Outpost, "p2", Coord::new(2, -2, 0))
            .with_structure(StructureKind::Outpost, "p2", Coord::new(-2, 2, 0))
            .with_structure(StructureKind::Outpost, "p2", Coord::new(0, 3, -3))
            .build_with_balance();
        gs.players[1].dominance_turn_counter = 99;

        // p2 dominates structures but has lost their HQ.
        let over = check_win_conditions(&mut gs, &balance, true).unwrap();
        assert_eq!(over.reason, WinReason::HqDestroyed);
        assert_eq!(over.winner_id, "p1");
    }

    #[test]
    fn sudden_death_tiebreak_structures_then_hp_then_draw() {
        let base = || {
            TestGame::new()
                .with_structure(StructureKind::Hq, "p1", Coord::new(0, -3, 3))
                .with_structure(StructureKind::Hq, "p2", Coord::new(0, 3, -3))
        };

        // Equal structures, p1 has more troop HP.
        let (mut gs, balance) = base()
            .with_troop("p1", TroopKind::Mech, Coord::origin(), true) // 12 HP
            .with_troop("p2", TroopKind::Marine, Coord::new(1, -1, 0), true) // 10 HP
            .build_with_balance();
        gs.sudden_death_active = true;
        gs.safe_zone_radius = 1;
        let over = check_win_conditions(&mut gs, &balance, false).unwrap();
        assert_eq!(over.winner_id, "p1");
        assert_eq!(over.reason, WinReason::SuddenDeath);

        // More structures wins outright.
        let (mut gs, balance) = base()
            .with_structure(StructureKind::Outpost, "p2", Coord::new(2, -2, 0))
            .build_with_balance();
        gs.sudden_death_active = true;
        gs.safe_zone_radius = 1;
        let over = check_win_conditions(&mut gs, &balance, false).unwrap();
        assert_eq!(over.winner_id, "p2");

        // Full tie is a draw with an empty winner.
        let (mut gs, balance) = base().build_with_balance();
        gs.sudden_death_active = true;
        gs.safe_zone_radius = 1;
        let over = check_win_conditions(&mut gs, &balance, false).unwrap();
        assert_eq!(over.winner_id, "");
        assert_eq!(over.reason, WinReason::Draw);
    }

    #[test]
    fn forfeit_and_disconnect_name_the_other_player() {
        let (mut gs, _) = TestGame::new().build_with_balance();
        let over = check_forfeit(&mut gs, "p1");
        assert_eq!(over.winner_id, "p2");
        assert_eq!(over.reason, WinReason::Forfeit);

        let (mut gs, _) = TestGame::new().build_with_balance();
        let over = check_disconnect_forfeit(&mut gs, "p2");
        assert_eq!(over.winner_id, "p1");
        assert_eq!(over.reason, WinReason::Disconnect);
    }

    #[test]
    fn game_over_includes_final_stats() {
        let (mut gs, _) = TestGame::new()
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .with_turn(12)
            .build_with_balance();
        gs.stats[0].troops_killed = 3;
        let over = check_forfeit(&mut gs, "p2");
        let p1_stats = over.stats.get("p1").unwrap();
        assert_eq!(p1_stats.turns_played, 12);
        assert_eq!(p1_stats.troops_killed, 3);
        assert_eq!(p1_stats.structures_held, 1);
    }
}
