use crate::hex::metrics::{INNER_DIAMETER, OUTER_RADIUS};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the hex grid, in cube coordinates. Cube coordinates have
/// three components where `x + y + z = 0`, so only `x` and `z` are stored and
/// `y` is derived.
///
/// Storage uses an offset layout instead: `(col, row)` where `row = z` and
/// `col = x + z / 2`. Odd rows are shifted half a cell to the east.
///
/// When the map wraps cylindrically, construct coordinates with
/// [HexCoordinates::new_wrapped] so that the offset column always lands in
/// `[0, wrap_size)`.
///
/// See https://www.redblobgames.com/grids/hexagons/#coordinates-cube
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct HexCoordinates {
    x: i32,
    z: i32,
}

impl HexCoordinates {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Create coordinates on a cylindrically wrapped map. If the offset
    /// column falls outside the map, it is shifted back across the seam.
    pub fn new_wrapped(x: i32, z: i32, wrap_size: i32) -> Self {
        let offset_x = x + z.div_euclid(2);
        let x = if offset_x < 0 {
            x + wrap_size
        } else if offset_x >= wrap_size {
            x - wrap_size
        } else {
            x
        };
        Self { x, z }
    }

    /// Convert from an offset (storage) position.
    pub fn from_offset(col: i32, row: i32) -> Self {
        Self::new(col - row.div_euclid(2), row)
    }

    /// Convert back into an offset position, as `(col, row)`.
    pub fn to_offset(self) -> (i32, i32) {
        (self.x + self.z.div_euclid(2), self.z)
    }

    /// Find the coordinates of the cell containing a world position. Each
    /// component is rounded independently, then the component with the
    /// largest rounding error is rebuilt from the other two.
    pub fn from_position(
        position: &Point3<f64>,
        wrap_size: Option<i32>,
    ) -> Self {
        let mut x = position.x / INNER_DIAMETER;
        let mut y = -x;
        let offset = position.z / (OUTER_RADIUS * 3.0);
        x -= offset;
        y -= offset;

        let mut ix = x.round() as i32;
        let iy = y.round() as i32;
        let mut iz = (-x - y).round() as i32;

        if ix + iy + iz != 0 {
            let dx = (x - ix as f64).abs();
            let dy = (y - iy as f64).abs();
            let dz = (-x - y - iz as f64).abs();

            if dx > dy && dx > dz {
                ix = -iy - iz;
            } else if dz > dy {
                iz = -ix - iy;
            }
            // Otherwise y had the largest error, which is implicit since y
            // isn't stored
        }

        match wrap_size {
            Some(wrap_size) => Self::new_wrapped(ix, iz, wrap_size),
            None => Self::new(ix, iz),
        }
    }

    pub fn x(self) -> i32 {
        self.x
    }

    pub fn y(self) -> i32 {
        -self.x - self.z
    }

    pub fn z(self) -> i32 {
        self.z
    }

    /// Number of steps between two cells. On a wrapped map, the distance
    /// across the seam is also considered and the shortest one wins.
    pub fn distance_to(self, other: Self, wrap_size: Option<i32>) -> i32 {
        let xy_distance = |other_x: i32| {
            (self.x - other_x).abs() + (self.y() - (-other_x - other.z)).abs()
        };

        let mut xy = xy_distance(other.x);
        if let Some(wrap_size) = wrap_size {
            // Only one of these can beat the straight distance
            let shifted = xy_distance(other.x + wrap_size);
            if shifted < xy {
                xy = shifted;
            } else {
                xy = xy.min(xy_distance(other.x - wrap_size));
            }
        }

        (xy + (self.z - other.z).abs()) / 2
    }
}

impl fmt::Display for HexCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::metrics::cell_center;

    #[test]
    fn test_offset_round_trip() {
        for row in 0..15 {
            for col in 0..20 {
                let coords = HexCoordinates::from_offset(col, row);
                assert_eq!(coords.to_offset(), (col, row));
                assert_eq!(coords.x() + coords.y() + coords.z(), 0);
            }
        }
    }

    #[test]
    fn test_from_offset() {
        assert_eq!(HexCoordinates::from_offset(0, 0), HexCoordinates::new(0, 0));
        assert_eq!(HexCoordinates::from_offset(3, 1), HexCoordinates::new(3, 1));
        assert_eq!(HexCoordinates::from_offset(3, 2), HexCoordinates::new(2, 2));
        assert_eq!(HexCoordinates::from_offset(0, 5), HexCoordinates::new(-2, 5));
        // Negative rows round toward negative infinity
        assert_eq!(HexCoordinates::from_offset(0, -1), HexCoordinates::new(1, -1));
        assert_eq!(HexCoordinates::from_offset(0, -2), HexCoordinates::new(1, -2));
    }

    #[test]
    fn test_negative_offset_round_trip() {
        for row in -6..0 {
            for col in -4..4 {
                let coords = HexCoordinates::from_offset(col, row);
                assert_eq!(coords.to_offset(), (col, row));
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(HexCoordinates::new(2, -3).to_string(), "(2, 1, -3)");
    }

    #[test]
    fn test_distance() {
        let origin = HexCoordinates::from_offset(0, 0);
        assert_eq!(origin.distance_to(origin, None), 0);
        assert_eq!(
            origin.distance_to(HexCoordinates::from_offset(3, 0), None),
            3
        );
        assert_eq!(
            origin.distance_to(HexCoordinates::from_offset(0, 4), None),
            4
        );
        assert_eq!(
            HexCoordinates::from_offset(2, 2)
                .distance_to(HexCoordinates::from_offset(5, 5), None),
            5
        );
    }

    #[test]
    fn test_distance_symmetric() {
        for (a, b) in &[((0, 0), (7, 3)), ((4, 9), (1, 2)), ((19, 14), (0, 0))] {
            let a = HexCoordinates::from_offset(a.0, a.1);
            let b = HexCoordinates::from_offset(b.0, b.1);
            assert_eq!(a.distance_to(b, None), b.distance_to(a, None));
            assert_eq!(a.distance_to(b, Some(20)), b.distance_to(a, Some(20)));
        }
    }

    #[test]
    fn test_distance_wrapped() {
        let west = HexCoordinates::from_offset(0, 0);
        let east = HexCoordinates::from_offset(19, 0);
        assert_eq!(west.distance_to(east, None), 19);
        assert_eq!(west.distance_to(east, Some(20)), 1);
        assert_eq!(east.distance_to(west, Some(20)), 1);

        // Going across the seam isn't always shorter
        let middle = HexCoordinates::from_offset(10, 0);
        assert_eq!(west.distance_to(middle, Some(20)), 10);
        assert_eq!(
            HexCoordinates::from_offset(8, 0)
                .distance_to(HexCoordinates::from_offset(3, 0), Some(20)),
            5
        );
    }

    #[test]
    fn test_new_wrapped() {
        // Column -1 wraps to the last column
        assert_eq!(
            HexCoordinates::new_wrapped(-1, 0, 20).to_offset(),
            (19, 0)
        );
        // Column 20 wraps to the first column
        assert_eq!(HexCoordinates::new_wrapped(20, 0, 20).to_offset(), (0, 0));
        assert_eq!(HexCoordinates::new_wrapped(17, 4, 20).to_offset(), (19, 4));
        assert_eq!(HexCoordinates::new_wrapped(18, 4, 20).to_offset(), (0, 4));
    }

    #[test]
    fn test_from_position() {
        for &(col, row) in &[(0, 0), (3, 1), (7, 4), (12, 9), (19, 14)] {
            let center = cell_center(col, row);
            assert_eq!(
                HexCoordinates::from_position(&center, None),
                HexCoordinates::from_offset(col, row)
            );

            // Points just off the center still land in the same cell
            let nudged = Point3::new(center.x + 3.0, 0.0, center.z - 2.0);
            assert_eq!(
                HexCoordinates::from_position(&nudged, None),
                HexCoordinates::from_offset(col, row)
            );
        }
    }

    #[test]
    fn test_from_position_wrapped() {
        // One cell past the east edge lands on the first column
        let past_edge = cell_center(20, 0);
        assert_eq!(
            HexCoordinates::from_position(&past_edge, Some(20)).to_offset(),
            (0, 0)
        );
    }
}
