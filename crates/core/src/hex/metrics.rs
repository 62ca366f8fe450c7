//! Geometry constants shared by the grid, the noise context and the
//! generator. All distances are in world units.

use nalgebra::Point3;

/// Ratio between the inner (center to edge) and outer (center to corner)
/// radius of a hexagon, `sqrt(3) / 2`.
pub const OUTER_TO_INNER: f64 = 0.866025404;

/// Distance from a cell's center to any of its corners
pub const OUTER_RADIUS: f64 = 10.0;

/// Distance from a cell's center to the middle of any of its edges
pub const INNER_RADIUS: f64 = OUTER_RADIUS * OUTER_TO_INNER;

/// Distance between the centers of two horizontally adjacent cells
pub const INNER_DIAMETER: f64 = INNER_RADIUS * 2.0;

/// Vertical world distance of one elevation level
pub const ELEVATION_STEP: f64 = 3.0;

/// Maximum vertical noise offset applied to a cell's anchor position
pub const ELEVATION_PERTURB_STRENGTH: f64 = 1.5;

/// Maximum horizontal noise offset applied by [perturb](crate::NoiseContext::perturb)
pub const CELL_PERTURB_STRENGTH: f64 = 4.0;

/// Scale applied to world positions before sampling noise
pub const NOISE_SCALE: f64 = 0.003;

/// Width of a chunk, in cells. Map width must be a multiple of this.
pub const CHUNK_SIZE_X: i32 = 5;

/// Height of a chunk, in cells. Map height must be a multiple of this.
pub const CHUNK_SIZE_Z: i32 = 5;

/// Number of entries along each side of the hash grid
pub const HASH_GRID_SIZE: usize = 256;

/// Scale applied to world positions before looking up the hash grid
pub const HASH_GRID_SCALE: f64 = 0.25;

/// Is this a map size we can build? Both dimensions need to be positive and
/// a whole number of chunks.
pub fn is_supported_map_size(width: i32, height: i32) -> bool {
    width > 0
        && height > 0
        && width % CHUNK_SIZE_X == 0
        && height % CHUNK_SIZE_Z == 0
}

/// Width of a wrapped map in world units, used to blend noise across the
/// seam.
pub fn wrap_width(wrap_size: i32) -> f64 {
    wrap_size as f64 * INNER_DIAMETER
}

/// Center of the cell at the given offset position, at elevation zero. Odd
/// rows are shifted half a cell to the east.
pub fn cell_center(col: i32, row: i32) -> Point3<f64> {
    Point3::new(
        (col as f64 + row as f64 * 0.5 - (row / 2) as f64) * INNER_DIAMETER,
        0.0,
        row as f64 * OUTER_RADIUS * 1.5,
    )
}
