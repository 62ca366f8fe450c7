//! Hex geometry: cube coordinates, the six neighbor directions and the world
//! metrics of a cell.

mod coordinates;
mod direction;
pub mod metrics;

pub use coordinates::HexCoordinates;
pub use direction::{HexDirection, HexEdgeType};
