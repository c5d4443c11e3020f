use serde::{Deserialize, Serialize};

/// A position in cube coordinate space.
/// The invariant q + r + s = 0 must always hold.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

/// The six neighbour offsets for pointy-top hex grids, numbered 0-5
/// starting from east and going counter-clockwise.
pub const DIRECTIONS: [Coord; 6] = [
    Coord { q: 1, r: 0, s: -1 },  // east
    Coord { q: 1, r: -1, s: 0 },  // north-east
    Coord { q: 0, r: -1, s: 1 },  // north-west
    Coord { q: -1, r: 0, s: 1 },  // west
    Coord { q: -1, r: 1, s: 0 },  // south-west
    Coord { q: 0, r: 1, s: -1 },  // south-east
];

/// Returns the offset for the given direction, wrapping modulo 6.
pub fn direction(dir: i32) -> Coord {
    DIRECTIONS[dir.rem_euclid(6) as usize]
}

impl Coord {
    /// Creates a cube coordinate. Panics if q + r + s != 0; a bad triple is a
    /// programmer error, not a runtime case.
    pub fn new(q: i32, r: i32, s: i32) -> Self {
        assert!(q + r + s == 0, "invalid cube coordinate ({q}, {r}, {s}): q+r+s must equal 0");
        Coord { q, r, s }
    }

    /// Creates a cube coordinate from axial (q, r), deriving s = -q-r.
    pub fn from_axial(q: i32, r: i32) -> Self {
        Coord { q, r, s: -q - r }
    }

    /// The center hex (0, 0, 0).
    pub fn origin() -> Self {
        Coord::default()
    }

    pub fn add(self, other: Coord) -> Coord {
        Coord { q: self.q + other.q, r: self.r + other.r, s: self.s + other.s }
    }

    pub fn sub(self, other: Coord) -> Coord {
        Coord { q: self.q - other.q, r: self.r - other.r, s: self.s - other.s }
    }

    pub fn scale(self, k: i32) -> Coord {
        Coord { q: self.q * k, r: self.r * k, s: self.s * k }
    }

    /// The coordinate rotated 180 degrees around the origin: negation of all
    /// three components.
    pub fn rotate_180(self) -> Coord {
        Coord { q: -self.q, r: -self.r, s: -self.s }
    }

    /// Hex distance between two coordinates: max(|dq|, |dr|, |ds|).
    pub fn distance(self, other: Coord) -> i32 {
        let d = self.sub(other);
        d.q.abs().max(d.r.abs()).max(d.s.abs())
    }

    pub fn distance_to_origin(self) -> i32 {
        self.distance(Coord::origin())
    }

    /// The adjacent hex in the given direction (0-5).
    pub fn neighbor(self, dir: i32) -> Coord {
        self.add(direction(dir))
    }

    /// All six adjacent hexes in direction order.
    pub fn neighbors(self) -> [Coord; 6] {
        let mut out = [Coord::origin(); 6];
        for (i, d) in DIRECTIONS.iter().enumerate() {
            out[i] = self.add(*d);
        }
        out
    }

    /// All hexes at exactly `radius` from this coordinate. Starts at the hex
    /// `radius` steps to the south-west and walks the ring; 6*radius hexes
    /// for radius >= 1. Radius 0 yields just this coordinate.
    pub fn ring(self, radius: i32) -> Vec<Coord> {
        if radius == 0 {
            return vec![self];
        }
        let mut out = Vec::with_capacity(6 * radius as usize);
        let mut current = self.add(direction(4).scale(radius));
        for dir in 0..6 {
            for _ in 0..radius {
                out.push(current);
                current = current.neighbor(dir);
            }
        }
        out
    }

    /// This hex plus all rings from 1 up to and including `radius`.
    pub fn spiral(self, radius: i32) -> Vec<Coord> {
        let mut out = vec![self];
        for r in 1..=radius {
            out.extend(self.ring(r));
        }
        out
    }

    /// Pixel position of the hex center for pointy-top layout, where
    /// `hex_size` is the center-to-vertex distance.
    pub fn pixel_center(self, hex_size: f64) -> (f64, f64) {
        let sqrt3 = 3.0_f64.sqrt();
        let x = hex_size * (sqrt3 * self.q as f64 + sqrt3 / 2.0 * self.r as f64);
        let y = hex_size * (1.5 * self.r as f64);
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_origin_is_max_axis() {
        for q in -4..=4 {
            for r in -4..=4 {
                let c = Coord::from_axial(q, r);
                let expected = c.q.abs().max(c.r.abs()).max(c.s.abs());
                assert_eq!(c.distance_to_origin(), expected);
            }
        }
    }

    #[test]
    #[should_panic]
    fn new_rejects_bad_triple() {
        let _ = Coord::new(1, 1, 1);
    }

    #[test]
    fn from_axial_derives_s() {
        let c = Coord::from_axial(2, -1);
        assert_eq!(c, Coord::new(2, -1, -1));
    }

    #[test]
    fn ring_has_6r_hexes_at_distance_r() {
        for r in 1..=5 {
            let ring = Coord::origin().ring(r);
            assert_eq!(ring.len(), 6 * r as usize);
            for c in &ring {
                assert_eq!(c.distance_to_origin(), r);
            }
        }
    }

    #[test]
    fn ring_zero_is_center() {
        assert_eq!(Coord::origin().ring(0), vec![Coord::origin()]);
    }

    #[test]
    fn spiral_size() {
        for r in 0..=5 {
            let spiral = Coord::origin().spiral(r);
            assert_eq!(spiral.len(), (1 + 3 * r * (r + 1)) as usize);
        }
    }

    #[test]
    fn rotate_180_is_involution() {
        let c = Coord::new(3, -5, 2);
        assert_eq!(c.rotate_180().rotate_180(), c);
        assert_eq!(c.rotate_180(), Coord::new(-3, 5, -2));
    }

    #[test]
    fn neighbors_are_adjacent() {
        let c = Coord::new(2, -2, 0);
        for n in c.neighbors() {
            assert_eq!(c.distance(n), 1);
        }
    }

    #[test]
    fn direction_wraps() {
        assert_eq!(direction(6), direction(0));
        assert_eq!(direction(-1), direction(5));
    }
}
