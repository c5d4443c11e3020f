use std::collections::HashSet;

use super::Coord;

/// A bounded hexagonal grid: all hexes within `radius` of the origin.
#[derive(Debug, Default, Clone)]
pub struct Grid {
    radius: i32,
    hexes: HashSet<Coord>,
}

impl Grid {
    pub fn new(radius: i32) -> Self {
        let hexes = Coord::origin().spiral(radius).into_iter().collect();
        Grid { radius, hexes }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.hexes.contains(&c)
    }

    /// Total hex count; 3r(r+1) + 1 for radius r.
    pub fn hex_count(&self) -> usize {
        self.hexes.len()
    }

    /// All coordinates in the grid, in spiral order from the center.
    pub fn all_hexes(&self) -> Vec<Coord> {
        Coord::origin().spiral(self.radius)
    }

    /// Neighbours of `c` filtered to those inside the grid.
    pub fn neighbors(&self, c: Coord) -> Vec<Coord> {
        c.neighbors().into_iter().filter(|n| self.contains(*n)).collect()
    }

    /// All in-grid hexes within `distance` of `center`.
    pub fn hexes_in_range(&self, center: Coord, distance: i32) -> Vec<Coord> {
        center
            .spiral(distance)
            .into_iter()
            .filter(|c| self.contains(*c))
            .collect()
    }

    /// The outermost ring of the grid.
    pub fn edge_hexes(&self) -> Vec<Coord> {
        Coord::origin().ring(self.radius)
    }

    /// One hemisphere of the grid, used for rotationally symmetric map
    /// generation: hexes with q > 0, or q == 0 and r > 0. Excludes the
    /// center.
    pub fn half_grid(&self) -> Vec<Coord> {
        self.all_hexes()
            .into_iter()
            .filter(|c| c.q > 0 || (c.q == 0 && c.r > 0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_count_formula() {
        for r in 1..=7 {
            let grid = Grid::new(r);
            assert_eq!(grid.hex_count(), (3 * r * (r + 1) + 1) as usize);
        }
    }

    #[test]
    fn contains_respects_radius() {
        let grid = Grid::new(3);
        assert!(grid.contains(Coord::new(3, -3, 0)));
        assert!(!grid.contains(Coord::new(4, -4, 0)));
        assert!(grid.contains(Coord::origin()));
    }

    #[test]
    fn neighbors_clipped_at_edge() {
        let grid = Grid::new(2);
        let corner = Coord::new(2, -2, 0);
        let ns = grid.neighbors(corner);
        assert!(ns.len() < 6);
        for n in ns {
            assert!(grid.contains(n));
        }
    }

    #[test]
    fn half_grid_is_exactly_half_of_non_center() {
        let grid = Grid::new(4);
        let half = grid.half_grid();
        assert_eq!(half.len(), (grid.hex_count() - 1) / 2);
        // No hex and its rotation both in the half.
        for c in &half {
            assert!(!half.contains(&c.rotate_180()));
        }
    }

    #[test]
    fn edge_hexes_at_radius() {
        let grid = Grid::new(5);
        for c in grid.edge_hexes() {
            assert_eq!(c.distance_to_origin(), 5);
        }
    }
}
