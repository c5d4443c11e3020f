use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// Skew factors for 2-D simplex noise.
const F2: f64 = 0.366_025_403_784_438_6; // (sqrt(3) - 1) / 2
const G2: f64 = 0.211_324_865_405_187_1; // (3 - sqrt(3)) / 6

const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Seeded 2-D simplex noise for terrain generation. Deterministic per seed.
pub struct NoiseGenerator {
    perm: Vec<usize>,
    scale: f64,
}

impl NoiseGenerator {
    pub fn new(seed: u64, scale: f64) -> Self {
        let mut table: Vec<usize> = (0..256).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        table.shuffle(&mut rng);
        // Double the table so index wrapping needs no modulo.
        let mut perm = Vec::with_capacity(512);
        perm.extend_from_slice(&table);
        perm.extend_from_slice(&table);
        NoiseGenerator { perm, scale }
    }

    /// Raw simplex noise at (x, y), scaled, in [-1, 1].
    pub fn eval2(&self, x: f64, y: f64) -> f64 {
        self.raw(x * self.scale, y * self.scale)
    }

    /// Noise normalized to [0, 1].
    pub fn eval01(&self, x: f64, y: f64) -> f64 {
        (self.eval2(x, y) + 1.0) / 2.0
    }

    /// Multi-octave noise in [0, 1]: 3 octaves with halving amplitude and
    /// doubling frequency.
    pub fn multi_octave(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..3 {
            value += self.raw(x * self.scale * frequency, y * self.scale * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        (value / max_amplitude + 1.0) / 2.0
    }

    fn gradient(&self, i: i64, j: i64) -> (f64, f64) {
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        GRADIENTS[self.perm[ii + self.perm[jj]] & 7]
    }

    fn raw(&self, x: f64, y: f64) -> f64 {
        // Skew input space to find the containing simplex cell.
        let s = (x + y) * F2;
        let i = (x + s).floor() as i64;
        let j = (y + s).floor() as i64;
        let t = (i + j) as f64 * G2;
        let x0 = x - (i as f64 - t);
        let y0 = y - (j as f64 - t);

        // Offsets for the middle corner depend on which triangle we are in.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let mut total = 0.0;
        for &(dx, dy, gi, gj) in &[
            (x0, y0, i, j),
            (x1, y1, i + i1, j + j1),
            (x2, y2, i + 1, j + 1),
        ] {
            let falloff = 0.5 - dx * dx - dy * dy;
            if falloff > 0.0 {
                let (gx, gy) = self.gradient(gi, gj);
                total += falloff.powi(4) * (gx * dx + gy * dy);
            }
        }

        // Scale the contribution sum to roughly [-1, 1].
        (70.0 * total).clamp(-1.0, 1.0)
    }
}
