use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Balance;
use crate::hex::{Coord, Grid};
use crate::model::{MapSize, StructureKind, TerrainKind, TerrainMap};

use super::noise::NoiseGenerator;
use super::placement::{assign_structure_kinds, place_hqs, place_neutral_structures};
use super::symmetry::apply_symmetry;
use super::validation::validate_map;

const NOISE_SCALE: f64 = 0.15;

/// Output of map generation.
#[derive(Debug, Clone)]
pub struct MapResult {
    pub terrain: TerrainMap,
    pub hq1: Coord,
    pub hq2: Coord,
    pub structures: Vec<StructurePlacement>,
}

/// A structure's position and type; owner is empty for neutral placements
/// and filled in by the caller for HQs.
#[derive(Debug, Clone)]
pub struct StructurePlacement {
    pub position: Coord,
    pub kind: StructureKind,
    pub owner_id: String,
}

/// Creates a procedural hex map. Deterministic in the seed; retries with
/// seed + attempt_index until validation passes or retries are exhausted.
pub fn generate(map_size: MapSize, seed: u64, balance: &Balance) -> Result<MapResult, String> {
    let grid = Grid::new(map_size.radius());
    let max_retries = balance.map_generation.max_retries;
    let min_passable_ratio = balance.map_generation.min_passable_ratio;
    let structure_count = balance.structure_count(map_size);

    let mut rng = StdRng::seed_from_u64(seed);

    for attempt in 0..max_retries {
        let attempt_seed = seed.wrapping_add(attempt as u64);
        let mut terrain = generate_terrain(&grid, attempt_seed, balance);

        let (hq1, hq2) = place_hqs(&grid);

        // HQ hexes and surroundings must be passable.
        ensure_passable(&mut terrain, &grid, balance, hq1, 2);
        ensure_passable(&mut terrain, &grid, balance, hq2, 2);

        apply_symmetry(&mut terrain, &grid);

        let positions =
            place_neutral_structures(&grid, &terrain, balance, hq1, hq2, structure_count, &mut rng);

        if !validate_map(&grid, &terrain, balance, hq1, hq2, &positions, min_passable_ratio) {
            continue;
        }

        let kinds = assign_structure_kinds(&positions);

        let mut structures = vec![
            StructurePlacement { position: hq1, kind: StructureKind::Hq, owner_id: String::new() },
            StructurePlacement { position: hq2, kind: StructureKind::Hq, owner_id: String::new() },
        ];
        for pos in positions {
            let kind = kinds.get(&pos).copied().unwrap_or(StructureKind::Outpost);
            structures.push(StructurePlacement { position: pos, kind, owner_id: String::new() });
        }

        return Ok(MapResult { terrain, hq1, hq2, structures });
    }

    Err(format!("failed to generate valid map after {max_retries} attempts"))
}

/// Assigns terrain from multi-octave noise. Only one half is generated here;
/// symmetry mirrors it to the other.
fn generate_terrain(grid: &Grid, seed: u64, balance: &Balance) -> TerrainMap {
    let noise = NoiseGenerator::new(seed, NOISE_SCALE);

    let water = balance.noise_threshold("water", 0.15);
    let plains = balance.noise_threshold("plains", 0.55);
    let forest = balance.noise_threshold("forest", 0.75);
    let hills = balance.noise_threshold("hills", 0.88);

    let mut terrain = TerrainMap::new();
    for c in grid.half_grid() {
        let (x, y) = c.pixel_center(1.0);
        let value = noise.multi_octave(x, y);
        terrain.set(c, noise_to_terrain(value, water, plains, forest, hills));
    }

    // Center is always plains.
    terrain.set(Coord::origin(), TerrainKind::Plains);

    terrain
}

fn noise_to_terrain(value: f64, water: f64, plains: f64, forest: f64, hills: f64) -> TerrainKind {
    if value < water {
        TerrainKind::Water
    } else if value < plains {
        TerrainKind::Plains
    } else if value < forest {
        TerrainKind::Forest
    } else if value < hills {
        TerrainKind::Hills
    } else {
        TerrainKind::Mountains
    }
}

/// Forces every hex within `radius` of `center` to passable terrain.
fn ensure_passable(terrain: &mut TerrainMap, grid: &Grid, balance: &Balance, center: Coord, radius: i32) {
    for c in grid.hexes_in_range(center, radius) {
        if !balance.is_passable(terrain.get(c)) {
            terrain.set(c, TerrainKind::Plains);
        }
    }
}
