//! Seeded dice rolling and dice-notation handling.
//!
//! Each game owns one `Roller` derived from the game seed, so combat is
//! reproducible per seed. No other task may touch a game's roller.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded dice roller for a single game instance.
pub struct Roller {
    rng: StdRng,
}

impl Roller {
    pub fn new(seed: u64) -> Self {
        Roller { rng: StdRng::seed_from_u64(seed) }
    }

    /// Returns a random integer in [1, sides].
    pub fn roll(&mut self, sides: u32) -> i32 {
        if sides < 1 {
            return 1;
        }
        self.rng.random_range(1..=sides) as i32
    }

    pub fn d20(&mut self) -> i32 {
        self.roll(20)
    }

    pub fn d8(&mut self) -> i32 {
        self.roll(8)
    }

    pub fn d6(&mut self) -> i32 {
        self.roll(6)
    }

    pub fn d4(&mut self) -> i32 {
        self.roll(4)
    }

    /// Rolls `count` dice of `sides` and adds the modifier.
    pub fn roll_damage(&mut self, dn: DiceNotation) -> i32 {
        let mut total = 0;
        for _ in 0..dn.count {
            total += self.roll(dn.sides);
        }
        total + dn.modifier
    }

    /// Rolls damage and halves it, rounded down, minimum 1. Used for
    /// counterattacks.
    pub fn roll_half_damage(&mut self, dn: DiceNotation) -> i32 {
        (self.roll_damage(dn) / 2).max(1)
    }
}

/// A parsed dice expression like "2D6+2".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotation {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceNotation {
    /// Reduces the die size one step: D8 -> D6, D6 -> D4, D4 stays D4.
    /// Count and modifier are preserved.
    pub fn step_down(self) -> DiceNotation {
        let sides = match self.sides {
            8 => 6,
            6 => 4,
            other => other,
        };
        DiceNotation { sides, ..self }
    }
}

impl FromStr for DiceNotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("invalid dice notation {s:?}");
        let d_pos = s.find(['D', 'd']).ok_or_else(err)?;
        let (count_str, rest) = s.split_at(d_pos);
        let rest = &rest[1..];
        let (sides_str, mod_str) = match rest.split_once('+') {
            Some((sides, modifier)) => (sides, Some(modifier)),
            None => (rest, None),
        };

        let count: u32 = count_str.parse().map_err(|_| err())?;
        let sides: u32 = sides_str.parse().map_err(|_| err())?;
        let modifier: i32 = match mod_str {
            Some(m) => m.parse().map_err(|_| err())?,
            None => 0,
        };
        if count == 0 || sides == 0 {
            return Err(err());
        }
        Ok(DiceNotation { count, sides, modifier })
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier > 0 {
            write!(f, "{}D{}+{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}D{}", self.count, self.sides)
        }
    }
}
