use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::Balance;
use crate::hex::{Coord, Grid};
use crate::model::{StructureKind, TerrainMap};

/// Minimum hex distance between any two placed structures.
const MIN_STRUCTURE_SPACING: i32 = 2;

/// Minimum hex distance from either HQ for neutral placements.
const MIN_HQ_DISTANCE: i32 = 3;

/// Places the two HQs at opposite poles of the grid, a 180°-rotation pair.
pub fn place_hqs(grid: &Grid) -> (Coord, Coord) {
    let r = grid.radius();
    (Coord::new(0, -r, r), Coord::new(0, r, -r))
}

/// Places `count` neutral structures with an even center/mid/outer spread,
/// mirroring every pick to its 180° counterpart. Returns all positions.
pub fn place_neutral_structures(
    grid: &Grid,
    terrain: &TerrainMap,
    balance: &Balance,
    hq1: Coord,
    hq2: Coord,
    count: usize,
    rng: &mut StdRng,
) -> Vec<Coord> {
    let radius = grid.radius();
    let candidates = gather_candidates(grid, terrain, balance, hq1, hq2);
    if candidates.is_empty() {
        return Vec::new();
    }

    let center_radius = radius / 3;
    let mid_radius = radius * 2 / 3;

    let mut center_candidates = Vec::new();
    let mut mid_candidates = Vec::new();
    let mut outer_candidates = Vec::new();
    for c in &candidates {
        let dist = c.distance_to_origin();
        if dist <= center_radius {
            center_candidates.push(*c);
        } else if dist <= mid_radius {
            mid_candidates.push(*c);
        } else {
            outer_candidates.push(*c);
        }
    }

    // Structures are placed in one half only and mirrored; an odd count puts
    // one extra structure near the center.
    let half_count = count / 2;
    let has_center = count % 2 == 1;

    let mut positions = Vec::new();
    let mut placed: HashSet<Coord> = HashSet::new();

    if has_center && !center_candidates.is_empty() {
        center_candidates.sort_by_key(|c| (c.distance_to_origin(), c.q, c.r));
        let pick = center_candidates[0];
        positions.push(pick);
        placed.insert(pick);
        placed.insert(pick.rotate_180());
    }

    // ~40% center, ~30% mid, remainder outer, of the half count.
    let center_count = (half_count * 40 / 100).max(1);
    let mut mid_count = (half_count * 30 / 100).max(1);
    let mut outer_count = half_count.saturating_sub(center_count + mid_count);
    if center_count + mid_count > half_count {
        mid_count = half_count.saturating_sub(center_count);
        outer_count = 0;
    }

    let in_half = |c: &Coord| c.q > 0 || (c.q == 0 && c.r > 0);
    let center_half: Vec<Coord> = center_candidates.iter().copied().filter(in_half).collect();
    let mid_half: Vec<Coord> = mid_candidates.iter().copied().filter(in_half).collect();
    let outer_half: Vec<Coord> = outer_candidates.iter().copied().filter(in_half).collect();

    let mut half_positions = Vec::new();
    pick_from_zone(center_half, center_count, &mut placed, &mut half_positions, rng);
    pick_from_zone(mid_half, mid_count, &mut placed, &mut half_positions, rng);
    pick_from_zone(outer_half, outer_count, &mut placed, &mut half_positions, rng);

    // Top up from the full candidate set if the zones came short.
    if half_positions.len() < half_count {
        let all_half: Vec<Coord> = candidates.iter().copied().filter(in_half).collect();
        let remaining = half_count - half_positions.len();
        pick_from_zone(all_half, remaining, &mut placed, &mut half_positions, rng);
    }

    for pos in half_positions {
        positions.push(pos);
        let rotated = pos.rotate_180();
        if rotated != pos {
            positions.push(rotated);
        }
    }

    positions
}

/// Assigns types to neutral positions: ~30% command centers, the rest
/// outposts; a mirrored pair always shares its type.
pub fn assign_structure_kinds(positions: &[Coord]) -> HashMap<Coord, StructureKind> {
    let mut result = HashMap::new();
    let cc_count = (positions.len() * 30 / 100).max(1);

    let mut assigned = 0;
    let mut paired: HashSet<Coord> = HashSet::new();
    for pos in positions {
        if paired.contains(pos) {
            continue;
        }
        let kind = if assigned < cc_count {
            StructureKind::CommandCenter
        } else {
            StructureKind::Outpost
        };
        assigned += 1;

        result.insert(*pos, kind);
        paired.insert(*pos);
        let rotated = pos.rotate_180();
        if rotated != *pos {
            result.insert(rotated, kind);
            paired.insert(rotated);
        }
    }

    result
}

fn pick_from_zone(
    mut zone: Vec<Coord>,
    n: usize,
    placed: &mut HashSet<Coord>,
    out: &mut Vec<Coord>,
    rng: &mut StdRng,
) {
    zone.shuffle(rng);
    let mut picked = 0;
    for c in zone {
        if picked >= n {
            break;
        }
        if placed.contains(&c) || placed.contains(&c.rotate_180()) {
            continue;
        }
        if placed.iter().any(|p| c.distance(*p) < MIN_STRUCTURE_SPACING) {
            continue;
        }
        out.push(c);
        placed.insert(c);
        placed.insert(c.rotate_180());
        picked += 1;
    }
}

fn gather_candidates(
    grid: &Grid,
    terrain: &TerrainMap,
    balance: &Balance,
    hq1: Coord,
    hq2: Coord,
) -> Vec<Coord> {
    grid.all_hexes()
        .into_iter()
        .filter(|c| balance.is_passable(terrain.get(*c)))
        .filter(|c| c.distance(hq1) >= MIN_HQ_DISTANCE && c.distance(hq2) >= MIN_HQ_DISTANCE)
        .filter(|c| *c != hq1 && *c != hq2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testutil::test_balance;
    use rand::SeedableRng;

    fn all_plains(grid: &Grid) -> TerrainMap {
        grid.all_hexes()
            .into_iter()
            .map(|c| (c, crate::model::TerrainKind::Plains))
            .collect()
    }

    #[test]
    fn placements_respect_spacing_and_hq_distance() {
        let balance = test_balance();
        let grid = Grid::new(7);
        let terrain = all_plains(&grid);
        let (hq1, hq2) = place_hqs(&grid);
        let mut rng = StdRng::seed_from_u64(9);

        let positions =
            place_neutral_structures(&grid, &terrain, &balance, hq1, hq2, 5, &mut rng);
        assert!(!positions.is_empty());

        for (i, a) in positions.iter().enumerate() {
            assert!(a.distance(hq1) >= MIN_HQ_DISTANCE);
            assert!(a.distance(hq2) >= MIN_HQ_DISTANCE);
            for b in positions.iter().skip(i + 1) {
                assert!(a.distance(*b) >= MIN_STRUCTURE_SPACING, "{a:?} and {b:?} too close");
            }
        }
    }

    #[test]
    fn placements_are_mirrored() {
        let balance = test_balance();
        let grid = Grid::new(7);
        let terrain = all_plains(&grid);
        let (hq1, hq2) = place_hqs(&grid);
        let mut rng = StdRng::seed_from_u64(4);

        let positions =
            place_neutral_structures(&grid, &terrain, &balance, hq1, hq2, 6, &mut rng);
        let set: HashSet<Coord> = positions.iter().copied().collect();
        for p in &positions {
            assert!(set.contains(&p.rotate_180()), "missing mirror of {p:?}");
        }
    }

    #[test]
    fn kind_assignment_pairs_match_and_quota_holds() {
        let positions: Vec<Coord> = vec![
            Coord::new(2, 0, -2),
            Coord::new(-2, 0, 2),
            Coord::new(0, 3, -3),
            Coord::new(0, -3, 3),
            Coord::new(4, -1, -3),
            Coord::new(-4, 1, 3),
        ];
        let kinds = assign_structure_kinds(&positions);
        assert_eq!(kinds.len(), positions.len());
        for p in &positions {
            assert_eq!(kinds[p], kinds[&p.rotate_180()]);
        }
        let cc = kinds.values().filter(|k| **k == StructureKind::CommandCenter).count();
        assert!(cc >= 1);
        assert!(kinds.values().any(|k| *k == StructureKind::Outpost));
    }
}
