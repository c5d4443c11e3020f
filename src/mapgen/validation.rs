use std::collections::{HashSet, VecDeque};

use crate::config::Balance;
use crate::hex::{Coord, Grid};
use crate::model::TerrainMap;

/// Checks all map constraints:
/// both HQs connected, every structure reachable from both HQs, a single
/// passable component, a minimum passable ratio, and passable terrain
/// everywhere within 2 hexes of either HQ.
pub fn validate_map(
    grid: &Grid,
    terrain: &TerrainMap,
    balance: &Balance,
    hq1: Coord,
    hq2: Coord,
    structure_positions: &[Coord],
    min_passable_ratio: f64,
) -> bool {
    let from_hq1 = flood_fill(grid, terrain, balance, hq1);
    if !from_hq1.contains(&hq2) {
        return false;
    }

    let from_hq2 = flood_fill(grid, terrain, balance, hq2);
    for pos in structure_positions {
        if !from_hq1.contains(pos) || !from_hq2.contains(pos) {
            return false;
        }
    }

    if !single_passable_component(grid, terrain, balance) {
        return false;
    }

    if !passable_ratio_ok(grid, terrain, balance, min_passable_ratio) {
        return false;
    }

    hq_safety_ok(grid, terrain, balance, hq1) && hq_safety_ok(grid, terrain, balance, hq2)
}

/// All passable hexes reachable from `start` by passable-only BFS.
fn flood_fill(grid: &Grid, terrain: &TerrainMap, balance: &Balance, start: Coord) -> HashSet<Coord> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for neighbor in grid.neighbors(current) {
            if visited.contains(&neighbor) {
                continue;
            }
            if !balance.is_passable(terrain.get(neighbor)) {
                continue;
            }
            visited.insert(neighbor);
            queue.push_back(neighbor);
        }
    }

    visited
}

fn single_passable_component(grid: &Grid, terrain: &TerrainMap, balance: &Balance) -> bool {
    let passable: Vec<Coord> = grid
        .all_hexes()
        .into_iter()
        .filter(|c| balance.is_passable(terrain.get(*c)))
        .collect();
    let Some(start) = passable.first() else {
        return false;
    };

    let visited = flood_fill(grid, terrain, balance, *start);
    visited.len() == passable.len()
}

fn passable_ratio_ok(grid: &Grid, terrain: &TerrainMap, balance: &Balance, min_ratio: f64) -> bool {
    let total = grid.hex_count();
    let passable = grid
        .all_hexes()
        .into_iter()
        .filter(|c| balance.is_passable(terrain.get(*c)))
        .count();
    passable as f64 / total as f64 >= min_ratio
}

fn hq_safety_ok(grid: &Grid, terrain: &TerrainMap, balance: &Balance, hq: Coord) -> bool {
    grid.hexes_in_range(hq, 2)
        .into_iter()
        .all(|c| balance.is_passable(terrain.get(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testutil::test_balance;
    use crate::model::TerrainKind;

    fn all_plains(grid: &Grid) -> TerrainMap {
        grid.all_hexes().into_iter().map(|c| (c, TerrainKind::Plains)).collect()
    }

    #[test]
    fn open_map_validates() {
        let balance = test_balance();
        let grid = Grid::new(5);
        let terrain = all_plains(&grid);
        let hq1 = Coord::new(0, -5, 5);
        let hq2 = Coord::new(0, 5, -5);
        assert!(validate_map(&grid, &terrain, &balance, hq1, hq2, &[Coord::origin()], 0.6));
    }

    #[test]
    fn wall_between_hqs_fails_connectivity() {
        let balance = test_balance();
        let grid = Grid::new(5);
        let mut terrain = all_plains(&grid);
        // Impassable band across the middle row splits the map.
        for c in grid.all_hexes() {
            if c.r == 0 {
                terrain.set(c, TerrainKind::Mountains);
            }
        }
        let hq1 = Coord::new(0, -5, 5);
        let hq2 = Coord::new(0, 5, -5);
        assert!(!validate_map(&grid, &terrain, &balance, hq1, hq2, &[], 0.1));
    }

    #[test]
    fn unreachable_structure_fails() {
        let balance = test_balance();
        let grid = Grid::new(5);
        let mut terrain = all_plains(&grid);
        // Wall off a corner pocket containing the structure.
        let pocket = Coord::new(5, -5, 0);
        for n in grid.neighbors(pocket) {
            terrain.set(n, TerrainKind::Water);
        }
        let hq1 = Coord::new(0, -5, 5);
        let hq2 = Coord::new(0, 5, -5);
        assert!(!validate_map(&grid, &terrain, &balance, hq1, hq2, &[pocket], 0.1));
    }

    #[test]
    fn low_passable_ratio_fails() {
        let balance = test_balance();
        let grid = Grid::new(5);
        let terrain = all_plains(&grid);
        let hq1 = Coord::new(0, -5, 5);
        let hq2 = Coord::new(0, 5, -5);
        assert!(!validate_map(&grid, &terrain, &balance, hq1, hq2, &[], 1.01));
    }

    #[test]
    fn impassable_next_to_hq_fails() {
        let balance = test_balance();
        let grid = Grid::new(5);
        let mut terrain = all_plains(&grid);
        let hq1 = Coord::new(0, -5, 5);
        let hq2 = Coord::new(0, 5, -5);
        terrain.set(hq1.neighbor(5), TerrainKind::Mountains);
        assert!(!validate_map(&grid, &terrain, &balance, hq1, hq2, &[], 0.1));
    }
}
