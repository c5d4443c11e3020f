//! Cube-coordinate hex algebra and the bounded game grid.

mod coords;
mod grid;

pub use coords::{direction, Coord, DIRECTIONS};
pub use grid::Grid;
