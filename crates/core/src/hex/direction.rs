use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The 6 directions in which hex cells line up side-to-side, going clockwise
/// from north-east. Cells are "pointy topped", so there is no north or south
/// neighbor. The discriminant of each variant is its index in a cell's
/// neighbor array.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HexDirection {
    NorthEast = 0,
    East = 1,
    SouthEast = 2,
    SouthWest = 3,
    West = 4,
    NorthWest = 5,
}

impl HexDirection {
    /// All directions, in index order.
    pub const ALL: [Self; 6] = [
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Index of this direction, in `[0, 6)`
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get the direction for an index. The index wraps around, so any value is
    /// accepted.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    /// The direction pointing the other way
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// The neighboring direction, counter-clockwise
    pub fn previous(self) -> Self {
        Self::from_index(self.index() + 5)
    }

    /// The neighboring direction, clockwise
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Two steps counter-clockwise
    pub fn previous2(self) -> Self {
        Self::from_index(self.index() + 4)
    }

    /// Two steps clockwise
    pub fn next2(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}

/// Classification of the edge between two cells, based on the difference in
/// their elevations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HexEdgeType {
    /// Both cells are at the same elevation
    Flat,
    /// Elevations differ by exactly one step
    Slope,
    /// Elevations differ by more than one step. Impassable for units.
    Cliff,
}

impl HexEdgeType {
    pub fn between(elevation1: i32, elevation2: i32) -> Self {
        match (elevation1 - elevation2).abs() {
            0 => Self::Flat,
            1 => Self::Slope,
            _ => Self::Cliff,
        }
    }
}
