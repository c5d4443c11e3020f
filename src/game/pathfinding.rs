use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::config::Balance;
use crate::hex::Coord;
use crate::model::Troop;

use super::state::GameState;

/// All hexes a troop can move to with its remaining mobility, mapped to the
/// movement cost of reaching them.
///
/// Dijkstra over the weighted hex graph: edge weight is the destination
/// terrain's movement cost, impassable terrain and enemy-held hexes are
/// excluded, friendly-held hexes can be passed through but not stopped on,
/// and the start hex is not a destination.
pub fn reachable_hexes(gs: &GameState, balance: &Balance, troop: &Troop) -> HashMap<Coord, i32> {
    let start = troop.hex;
    let mobility = troop.remaining_mobility;

    let mut reached: HashMap<Coord, i32> = HashMap::new();
    reached.insert(start, 0);

    // Min-heap keyed on cost; ties broken on coordinates to keep pop order
    // deterministic.
    let mut frontier: BinaryHeap<Reverse<(i32, i32, i32, i32)>> = BinaryHeap::new();
    frontier.push(Reverse((0, start.q, start.r, start.s)));

    while let Some(Reverse((cost, q, r, s))) = frontier.pop() {
        let current = Coord::new(q, r, s);
        if cost > reached[&current] {
            continue; // stale entry
        }

        for neighbor in gs.grid.neighbors(current) {
            let terrain = gs.terrain_at(neighbor);
            if !balance.is_passable(terrain) {
                continue;
            }
            if gs.is_hex_occupied_by_enemy(neighbor, &troop.owner_id) {
                continue;
            }

            let total = cost + balance.movement_cost(terrain);
            if total > mobility {
                continue;
            }

            let better = match reached.get(&neighbor) {
                Some(prev) => total < *prev,
                None => true,
            };
            if better {
                reached.insert(neighbor, total);
                frontier.push(Reverse((total, neighbor.q, neighbor.r, neighbor.s)));
            }
        }
    }

    // Friendly troops are traversable but their hexes are not destinations;
    // the start hex is likewise excluded.
    reached
        .into_iter()
        .filter(|(pos, _)| *pos != start && gs.troop_at(*pos).is_none())
        .collect()
}

/// Movement cost to the target, or None if unreachable within the troop's
/// remaining mobility.
pub fn can_reach(gs: &GameState, balance: &Balance, troop: &Troop, target: Coord) -> Option<i32> {
    reachable_hexes(gs, balance, troop).get(&target).copied()
}

/// Pure range predicate: 1 <= distance <= troop range.
pub fn can_attack_target(troop: &Troop, target: Coord) -> bool {
    let dist = troop.hex.distance(target);
    (1..=troop.range).contains(&dist)
}
