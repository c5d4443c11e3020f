use crate::config::Balance;
use crate::hex::Coord;
use crate::server::messages::SuddenDeathDamage;

use super::state::GameState;

/// An HQ moved inside the shrinking safe zone.
#[derive(Debug, Clone)]
pub struct HqRelocation {
    pub player_id: String,
    pub from: Coord,
    pub to: Coord,
}

/// Runs the sudden-death step of the turn pipeline: activation check, zone
/// shrink, HQ relocation, and escalating storm damage to troops outside the
/// zone. Killed troops are removed from the state.
pub fn run_sudden_death_phase(
    gs: &mut GameState,
    balance: &Balance,
) -> (Vec<SuddenDeathDamage>, Vec<HqRelocation>) {
    if !check_sudden_death(gs, balance) {
        return (Vec::new(), Vec::new());
    }

    shrink_safe_zone(gs, balance);
    let relocations = relocate_hqs(gs, balance);
    let damages = apply_storm_damage(gs);
    (damages, relocations)
}

/// Activates or progresses sudden death once the turn number passes the
/// map-size threshold. Returns whether sudden death is active.
fn check_sudden_death(gs: &mut GameState, balance: &Balance) -> bool {
    let threshold = balance.sudden_death_threshold(gs.map_size);
    if gs.turn_number > threshold {
        gs.sudden_death_active = true;
        gs.sudden_death_turn = gs.turn_number - threshold;
        return true;
    }
    gs.sudden_death_active
}

/// Shrinks the safe zone by the configured rate, floored at radius 1.
fn shrink_safe_zone(gs: &mut GameState, balance: &Balance) -> i32 {
    gs.safe_zone_radius = (gs.safe_zone_radius - balance.shrink_rate()).max(1);
    gs.safe_zone_radius
}

/// Moves any HQ outside the safe zone to the nearest passable, unoccupied
/// hex inside it.
fn relocate_hqs(gs: &mut GameState, balance: &Balance) -> Vec<HqRelocation> {
    let mut relocations = Vec::new();

    for i in 0..2 {
        let player_id = gs.players[i].id.clone();
        let Some(hq) = gs.player_hq(&player_id) else {
            continue;
        };
        let (hq_id, old_hex) = (hq.id.clone(), hq.hex);

        if old_hex.distance_to_origin() > gs.safe_zone_radius {
            let new_hex = closest_free_hex_in_zone(gs, balance, old_hex, gs.safe_zone_radius);
            if let Some(s) = gs.get_structure_mut(&hq_id) {
                s.hex = new_hex;
            }
            relocations.push(HqRelocation { player_id, from: old_hex, to: new_hex });
        }
    }

    relocations
}

/// Damages every troop outside the safe zone by the number of elapsed
/// sudden-death turns; the storm escalates each turn.
fn apply_storm_damage(gs: &mut GameState) -> Vec<SuddenDeathDamage> {
    let damage = gs.sudden_death_turn as i32;
    let radius = gs.safe_zone_radius;

    let outside: Vec<String> = gs
        .troops
        .iter()
        .filter(|t| t.is_alive() && t.hex.distance_to_origin() > radius)
        .map(|t| t.id.clone())
        .collect();

    let mut damages = Vec::new();
    for id in outside {
        let Some(troop) = gs.get_troop_mut(&id) else {
            continue;
        };
        let killed = troop.take_damage(damage);
        damages.push(SuddenDeathDamage {
            unit_id: id.clone(),
            damage,
            hp_after: troop.current_hp,
            killed,
        });
        if killed {
            gs.remove_troop(&id);
        }
    }

    damages
}

/// The passable, troop-free, structure-free hex inside the zone closest to
/// `from`. Searched in spiral order, so ties resolve deterministically.
fn closest_free_hex_in_zone(gs: &GameState, balance: &Balance, from: Coord, radius: i32) -> Coord {
    let mut best: Option<(i32, Coord)> = None;

    for c in Coord::origin().spiral(radius) {
        if !gs.grid.contains(c) {
            continue;
        }
        if !balance.is_passable(gs.terrain_at(c)) {
            continue;
        }
        if gs.troop_at(c).is_some() || gs.structure_at(c).is_some() {
            continue;
        }
        let dist = from.distance(c);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, c));
        }
    }

    best.map(|(_, c)| c).unwrap_or_else(Coord::origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testutil::TestGame;
    use crate::model::{MapSize, StructureKind, TroopKind};

    #[test]
    fn inactive_before_threshold() {
        let (mut gs, balance) = TestGame::new().with_turn(20).build_with_balance();
        let (damages, relocations) = run_sudden_death_phase(&mut gs, &balance);
        assert!(!gs.sudden_death_active);
        assert!(damages.is_empty() && relocations.is_empty());
    }

    #[test]
    fn activates_past_threshold_and_tracks_elapsed_turns() {
        // Small map threshold is 20.
        let (mut gs, balance) = TestGame::new().with_turn(21).build_with_balance();
        run_sudden_death_phase(&mut gs, &balance);
        assert!(gs.sudden_death_active);
        assert_eq!(gs.sudden_death_turn, 1);
        assert_eq!(gs.safe_zone_radius, MapSize::Small.radius() - 1);

        gs.turn_number = 25;
        run_sudden_death_phase(&mut gs, &balance);
        assert_eq!(gs.sudden_death_turn, 5);
        assert_eq!(gs.safe_zone_radius, MapSize::Small.radius() - 2);
    }

    #[test]
    fn zone_never_shrinks_below_one() {
        let (mut gs, balance) = TestGame::new().with_turn(21).build_with_balance();
        gs.safe_zone_radius = 1;
        run_sudden_death_phase(&mut gs, &balance);
        assert_eq!(gs.safe_zone_radius, 1);
    }

    #[test]
    fn storm_damage_escalates_and_kills() {
        let (mut gs, balance) = TestGame::new()
            .with_turn(25)
            .with_troop("p1", TroopKind::Sniper, Coord::new(7, -7, 0), true)
            .with_troop("p1", TroopKind::Marine, Coord::origin(), true)
            .build_with_balance();
        // 5 elapsed turns -> 5 damage to the sniper (6 HP) outside the zone.
        let (damages, _) = run_sudden_death_phase(&mut gs, &balance);
        assert_eq!(damages.len(), 1);
        assert_eq!(damages[0].damage, 5);
        assert_eq!(damages[0].hp_after, 1);
        assert!(!damages[0].killed);

        // Next turn the storm deals 6 and finishes the sniper off.
        gs.turn_number = 26;
        let (damages, _) = run_sudden_death_phase(&mut gs, &balance);
        assert_eq!(damages.len(), 1);
        assert!(damages[0].killed);
        assert!(gs.troop_at(Coord::new(7, -7, 0)).is_none());
        // The marine in the center is untouched.
        assert!(gs.troop_at(Coord::origin()).is_some());
    }

    #[test]
    fn hq_outside_zone_is_relocated_inside() {
        let (mut gs, balance) = TestGame::new()
            .with_turn(21)
            .with_structure(StructureKind::Hq, "p1", Coord::new(0, -7, 7))
            .build_with_balance();
        let (_, relocations) = run_sudden_death_phase(&mut gs, &balance);
        assert_eq!(relocations.len(), 1);
        let hq = gs.player_hq("p1").unwrap();
        assert!(hq.hex.distance_to_origin() <= gs.safe_zone_radius);
        assert_eq!(relocations[0].to, hq.hex);
    }
}
