use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hex::Coord;
use super::TerrainKind;

/// Gameplay properties of a terrain type. Movement cost 0 means impassable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainInfo {
    pub movement_cost: i32,
    pub atk_modifier: i32,
    pub def_modifier: i32,
    pub passable: bool,
}

impl TerrainKind {
    /// Built-in terrain table; the balance catalog can override per-field.
    pub fn default_info(self) -> TerrainInfo {
        match self {
            TerrainKind::Plains => TerrainInfo { movement_cost: 1, atk_modifier: 0, def_modifier: 0, passable: true },
            TerrainKind::Forest => TerrainInfo { movement_cost: 2, atk_modifier: 0, def_modifier: 2, passable: true },
            TerrainKind::Hills => TerrainInfo { movement_cost: 2, atk_modifier: 1, def_modifier: 1, passable: true },
            TerrainKind::Water => TerrainInfo { movement_cost: 0, atk_modifier: 0, def_modifier: 0, passable: false },
            TerrainKind::Mountains => TerrainInfo { movement_cost: 0, atk_modifier: 0, def_modifier: 0, passable: false },
        }
    }
}

/// Total terrain assignment over the grid. Unset hexes read as plains.
///
/// Serialized as a list of (coord, terrain) pairs: JSON objects cannot key on
/// a cube coordinate.
#[derive(Debug, Default, Clone)]
pub struct TerrainMap {
    cells: HashMap<Coord, TerrainKind>,
}

impl TerrainMap {
    pub fn new() -> Self {
        TerrainMap::default()
    }

    pub fn get(&self, c: Coord) -> TerrainKind {
        self.cells.get(&c).copied().unwrap_or(TerrainKind::Plains)
    }

    pub fn set(&mut self, c: Coord, t: TerrainKind) {
        self.cells.insert(c, t);
    }

    pub fn raw(&self) -> &HashMap<Coord, TerrainKind> {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(Coord, TerrainKind)> for TerrainMap {
    fn from_iter<I: IntoIterator<Item = (Coord, TerrainKind)>>(iter: I) -> Self {
        TerrainMap { cells: iter.into_iter().collect() }
    }
}

impl Serialize for TerrainMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Sort for a stable wire representation.
        let mut entries: Vec<(&Coord, &TerrainKind)> = self.cells.iter().collect();
        entries.sort_by_key(|(c, _)| (c.q, c.r));
        serializer.collect_seq(entries)
    }
}

impl<'de> Deserialize<'de> for TerrainMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries: Vec<(Coord, TerrainKind)> = Vec::deserialize(deserializer)?;
        for (c, _) in &entries {
            if c.q + c.r + c.s != 0 {
                return Err(D::Error::custom("terrain entry with invalid cube coordinate"));
            }
        }
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_hex_defaults_to_plains() {
        let map = TerrainMap::new();
        assert_eq!(map.get(Coord::new(1, -1, 0)), TerrainKind::Plains);
    }

    #[test]
    fn serde_round_trip() {
        let mut map = TerrainMap::new();
        map.set(Coord::new(0, 0, 0), TerrainKind::Water);
        map.set(Coord::new(2, -1, -1), TerrainKind::Forest);
        let json = serde_json::to_string(&map).unwrap();
        let back: TerrainMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(Coord::new(0, 0, 0)), TerrainKind::Water);
        assert_eq!(back.get(Coord::new(2, -1, -1)), TerrainKind::Forest);
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn deserialize_rejects_bad_coord() {
        let json = r#"[[{"q":1,"r":1,"s":1},"plains"]]"#;
        assert!(serde_json::from_str::<TerrainMap>(json).is_err());
    }
}
