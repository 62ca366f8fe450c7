//! The cell graph. [HexGrid] owns every [HexCell] in a flat arena, addressed
//! by [CellIndex], along with the units standing on the map and the reusable
//! search state.
//!
//! Edits never touch renderers or other listeners directly. Every mutator
//! returns the list of [CellEffect]s the caller should forward to whatever
//! displays the map. Invalid edits are ignored and return no effects.

mod cell;
mod edit;
mod unit;

pub use cell::{HexCell, TerrainType};
pub use unit::{HexUnit, Mover, UnitId};

use crate::{
    hex::{
        metrics::{
            self, CHUNK_SIZE_X, CHUNK_SIZE_Z, ELEVATION_PERTURB_STRENGTH,
            ELEVATION_STEP,
        },
        HexCoordinates, HexDirection,
    },
    noise::NoiseContext,
    search::{PathQuery, SearchFrontier},
};
use anyhow::ensure;
use derive_more::Display;
use log::{debug, info};
use nalgebra::Point3;
use serde::Serialize;
use std::sync::Arc;

/// Position of a cell in its grid's arena. Indexes are row-major: the cell at
/// offset `(col, row)` has index `col + row * width`.
#[derive(
    Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[display(fmt = "cell#{}", _0)]
pub struct CellIndex(pub usize);

/// Something outside the grid needs to react to an edit. Effects are
/// deduplicated within one returned list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellEffect {
    /// The cell's view elevation changed, so sight lines may have changed
    ViewElevationChanged(CellIndex),
    /// The cell's anchor position moved
    Repositioned(CellIndex),
    /// The chunk with this index needs to be rebuilt
    RefreshChunk(usize),
    /// The unit must check that its cell still suits it
    ValidateUnitLocation(UnitId),
    /// The cell's terrain type changed
    TerrainChanged(CellIndex),
    /// The cell became visible, hidden or explored
    VisibilityChanged(CellIndex),
}

/// Push an effect unless it's already in the list
pub(crate) fn notify(effects: &mut Vec<CellEffect>, effect: CellEffect) {
    if !effects.contains(&effect) {
        effects.push(effect);
    }
}

/// A rectangular grid of hex cells, optionally wrapping east to west.
pub struct HexGrid {
    noise: Arc<NoiseContext>,
    width: i32,
    height: i32,
    wrapping: bool,
    chunk_count_x: i32,
    chunk_count_z: i32,
    pub(crate) cells: Vec<HexCell>,
    pub(crate) units: Vec<Option<HexUnit>>,
    pub(crate) frontier: SearchFrontier,
    pub(crate) current_path: Option<PathQuery>,
}

impl HexGrid {
    /// Create a new grid of flat cells. Fails if the size isn't a positive
    /// whole number of chunks.
    pub fn new(
        width: i32,
        height: i32,
        wrapping: bool,
        noise: Arc<NoiseContext>,
    ) -> anyhow::Result<Self> {
        let mut grid = Self {
            noise,
            width: 0,
            height: 0,
            wrapping: false,
            chunk_count_x: 0,
            chunk_count_z: 0,
            cells: Vec::new(),
            units: Vec::new(),
            frontier: SearchFrontier::default(),
            current_path: None,
        };
        grid.create_map(width, height, wrapping)?;
        Ok(grid)
    }

    /// Throw away the current map and replace it with flat, dry cells. Units
    /// and the current path are cleared as well. If the size is
    /// unsupported, an error is returned and the current map is kept as-is.
    pub fn create_map(
        &mut self,
        width: i32,
        height: i32,
        wrapping: bool,
    ) -> anyhow::Result<()> {
        ensure!(
            metrics::is_supported_map_size(width, height),
            "unsupported map size {}x{}; both dimensions must be positive \
            multiples of the {}x{} chunk size",
            width,
            height,
            CHUNK_SIZE_X,
            CHUNK_SIZE_Z
        );

        self.current_path = None;
        self.units.clear();
        self.frontier = SearchFrontier::default();
        self.width = width;
        self.height = height;
        self.wrapping = wrapping;
        self.chunk_count_x = width / CHUNK_SIZE_X;
        self.chunk_count_z = height / CHUNK_SIZE_Z;

        self.cells = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            for col in 0..width {
                self.create_cell(col, row);
            }
        }
        for index in 0..self.cells.len() {
            self.refresh_position(CellIndex(index));
        }

        info!(
            "Created {}x{} map ({} cells, {} chunks, wrapping: {})",
            width,
            height,
            self.cells.len(),
            self.chunk_count_x * self.chunk_count_z,
            wrapping
        );
        Ok(())
    }

    fn create_cell(&mut self, col: i32, row: i32) {
        let index = self.cells.len();
        let width = self.width;
        let chunk_index =
            (col / CHUNK_SIZE_X + row / CHUNK_SIZE_Z * self.chunk_count_x)
                as usize;
        let mut cell = HexCell::new(
            CellIndex(index),
            HexCoordinates::from_offset(col, row),
            col / CHUNK_SIZE_X,
            chunk_index,
            metrics::cell_center(col, row),
        );
        cell.explorable = if self.wrapping {
            row > 0 && row < self.height - 1
        } else {
            col > 0 && row > 0 && col < width - 1 && row < self.height - 1
        };
        self.cells.push(cell);

        // Connect to the cells that already exist: west, and the row below
        let index = index as i32;
        let cell = CellIndex(index as usize);
        if col > 0 {
            self.set_neighbor(
                cell,
                HexDirection::West,
                CellIndex((index - 1) as usize),
            );
            if self.wrapping && col == width - 1 {
                self.set_neighbor(
                    cell,
                    HexDirection::East,
                    CellIndex((index - col) as usize),
                );
            }
        }
        if row > 0 {
            if row % 2 == 0 {
                self.set_neighbor(
                    cell,
                    HexDirection::SouthEast,
                    CellIndex((index - width) as usize),
                );
                if col > 0 {
                    self.set_neighbor(
                        cell,
                        HexDirection::SouthWest,
                        CellIndex((index - width - 1) as usize),
                    );
                } else if self.wrapping {
                    self.set_neighbor(
                        cell,
                        HexDirection::SouthWest,
                        CellIndex((index - 1) as usize),
                    );
                }
            } else {
                self.set_neighbor(
                    cell,
                    HexDirection::SouthWest,
                    CellIndex((index - width) as usize),
                );
                if col < width - 1 {
                    self.set_neighbor(
                        cell,
                        HexDirection::SouthEast,
                        CellIndex((index - width + 1) as usize),
                    );
                } else if self.wrapping {
                    self.set_neighbor(
                        cell,
                        HexDirection::SouthEast,
                        CellIndex((index - width * 2 + 1) as usize),
                    );
                }
            }
        }
    }

    /// Connect two cells. The link is symmetric: `other` gets `cell` as its
    /// neighbor in the opposite direction.
    pub fn set_neighbor(
        &mut self,
        cell: CellIndex,
        direction: HexDirection,
        other: CellIndex,
    ) {
        self.cells[cell.0].neighbors[direction.index()] = Some(other);
        self.cells[other.0].neighbors[direction.opposite().index()] =
            Some(cell);
    }

    /// Recalculate the anchor height of a cell from its elevation, with a bit
    /// of noise so that equal elevations don't look perfectly flat.
    pub(crate) fn refresh_position(&mut self, cell: CellIndex) {
        let wrap_size = self.wrap_size();
        let cell = &mut self.cells[cell.0];
        let sample = self.noise.sample_noise(&cell.position, wrap_size);
        cell.position.y = cell.elevation as f64 * ELEVATION_STEP
            + (sample[1] * 2.0 - 1.0) * ELEVATION_PERTURB_STRENGTH;
    }

    /// Wipe all search bookkeeping on every cell and start the phase counter
    /// over. The current path is dropped.
    pub fn reset_search(&mut self) {
        debug!("Resetting search state for {} cells", self.cells.len());
        for cell in &mut self.cells {
            cell.search = Default::default();
        }
        self.frontier = SearchFrontier::default();
        self.current_path = None;
    }

    pub fn noise(&self) -> &NoiseContext {
        &self.noise
    }

    /// Number of cell columns
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of cell rows
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn wrapping(&self) -> bool {
        self.wrapping
    }

    /// The wrap width in cells, if the map wraps
    pub fn wrap_size(&self) -> Option<i32> {
        if self.wrapping {
            Some(self.width)
        } else {
            None
        }
    }

    pub fn chunk_count(&self) -> (i32, i32) {
        (self.chunk_count_x, self.chunk_count_z)
    }

    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    /// Get a cell by index. Panics if the index didn't come from this grid.
    pub fn cell(&self, index: CellIndex) -> &HexCell {
        &self.cells[index.0]
    }

    pub fn get_cell(&self, index: CellIndex) -> Option<&HexCell> {
        self.cells.get(index.0)
    }

    pub fn neighbor(
        &self,
        cell: CellIndex,
        direction: HexDirection,
    ) -> Option<CellIndex> {
        self.cells[cell.0].neighbor(direction)
    }

    /// Find the cell at an offset position. On a wrapping map the column is
    /// taken modulo the width.
    pub fn cell_at_offset(&self, col: i32, row: i32) -> Option<CellIndex> {
        if row < 0 || row >= self.height {
            return None;
        }
        let col = if self.wrapping {
            col.rem_euclid(self.width)
        } else if col < 0 || col >= self.width {
            return None;
        } else {
            col
        };
        Some(CellIndex((col + row * self.width) as usize))
    }

    pub fn cell_at_coordinates(
        &self,
        coordinates: HexCoordinates,
    ) -> Option<CellIndex> {
        let (col, row) = coordinates.to_offset();
        self.cell_at_offset(col, row)
    }

    /// Find the cell containing a world position
    pub fn cell_at_position(
        &self,
        position: &Point3<f64>,
    ) -> Option<CellIndex> {
        self.cell_at_coordinates(HexCoordinates::from_position(
            position,
            self.wrap_size(),
        ))
    }

    /// Number of steps between two cells, accounting for wrapping
    pub fn distance(&self, a: CellIndex, b: CellIndex) -> i32 {
        self.cells[a.0]
            .coordinates
            .distance_to(self.cells[b.0].coordinates, self.wrap_size())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn flat_grid(width: i32, height: i32, wrapping: bool) -> HexGrid {
        HexGrid::new(width, height, wrapping, Arc::new(NoiseContext::new(0)))
            .unwrap()
    }

    #[test]
    fn test_create_map() {
        let grid = flat_grid(20, 15, false);
        assert_eq!(grid.cells().len(), 300);
        assert_eq!(grid.chunk_count(), (4, 3));
        for (i, cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell.index(), CellIndex(i));
            assert_eq!(cell.elevation(), 0);
            let (col, row) = cell.coordinates().to_offset();
            assert_eq!(grid.cell_at_offset(col, row), Some(cell.index()));
            assert_eq!(cell.column_index(), col / 5);
        }

        let corner = grid.cell(CellIndex(299));
        assert_eq!(corner.chunk_index(), 11);
    }

    #[test]
    fn test_unsupported_size_keeps_map() {
        let mut grid = flat_grid(20, 15, false);
        assert!(grid.create_map(21, 15, false).is_err());
        assert!(grid.create_map(0, 15, false).is_err());
        assert!(grid.create_map(20, -5, true).is_err());
        assert_eq!(grid.width(), 20);
        assert_eq!(grid.cells().len(), 300);
    }

    #[test]
    fn test_neighbors_symmetric() {
        for &wrapping in &[false, true] {
            let grid = flat_grid(10, 10, wrapping);
            for cell in grid.cells() {
                for (direction, neighbor) in cell.neighbors() {
                    assert_eq!(
                        grid.neighbor(neighbor, direction.opposite()),
                        Some(cell.index()),
                        "{} -> {} ({:?})",
                        cell.index(),
                        neighbor,
                        direction
                    );
                    assert_eq!(grid.distance(cell.index(), neighbor), 1);
                }
            }
        }
    }

    #[test]
    fn test_neighbor_counts() {
        let grid = flat_grid(10, 10, false);
        // Interior cells have all six neighbors, corners have fewer
        let interior = grid.cell_at_offset(4, 4).unwrap();
        assert_eq!(grid.cell(interior).neighbors().count(), 6);
        assert_eq!(grid.cell(CellIndex(0)).neighbors().count(), 2);

        // With wrapping, only the top and bottom rows miss neighbors
        let grid = flat_grid(10, 10, true);
        for cell in grid.cells() {
            let (_, row) = cell.coordinates().to_offset();
            if row > 0 && row < 9 {
                assert_eq!(cell.neighbors().count(), 6);
            }
        }
        let west = grid.cell_at_offset(0, 3).unwrap();
        let east = grid.cell_at_offset(9, 3).unwrap();
        assert_eq!(grid.neighbor(west, HexDirection::West), Some(east));
    }

    #[test]
    fn test_explorable() {
        let grid = flat_grid(10, 10, false);
        assert!(!grid.cell(grid.cell_at_offset(0, 4).unwrap()).is_explorable());
        assert!(!grid.cell(grid.cell_at_offset(4, 9).unwrap()).is_explorable());
        assert!(grid.cell(grid.cell_at_offset(1, 1).unwrap()).is_explorable());

        let grid = flat_grid(10, 10, true);
        assert!(grid.cell(grid.cell_at_offset(0, 4).unwrap()).is_explorable());
        assert!(!grid.cell(grid.cell_at_offset(4, 0).unwrap()).is_explorable());
    }

    #[test]
    fn test_cell_lookup() {
        let grid = flat_grid(10, 10, false);
        assert_eq!(grid.cell_at_offset(-1, 0), None);
        assert_eq!(grid.cell_at_offset(0, 10), None);
        assert_eq!(grid.cell_at_offset(3, 2), Some(CellIndex(23)));

        let position = metrics::cell_center(3, 2);
        assert_eq!(grid.cell_at_position(&position), Some(CellIndex(23)));

        let grid = flat_grid(10, 10, true);
        assert_eq!(grid.cell_at_offset(-1, 0), Some(CellIndex(9)));
        assert_eq!(grid.cell_at_offset(10, 1), Some(CellIndex(10)));
    }
}
