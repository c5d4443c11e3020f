use crate::hex::{Coord, Grid};
use crate::model::{TerrainKind, TerrainMap};

/// Mirrors one half of the grid's terrain onto the other via 180° rotation.
/// The center hex is always plains.
pub fn apply_symmetry(terrain: &mut TerrainMap, grid: &Grid) {
    terrain.set(Coord::origin(), TerrainKind::Plains);

    for c in grid.half_grid() {
        let t = terrain.get(c);
        let rotated = c.rotate_180();
        if grid.contains(rotated) {
            terrain.set(rotated, t);
        }
    }
}
