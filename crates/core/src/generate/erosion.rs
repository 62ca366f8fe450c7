use crate::{
    generate::{Generate, MapBuilder},
    grid::{CellIndex, HexGrid},
};
use fnv::FnvBuildHasher;
use indexmap::IndexSet;
use log::{debug, warn};
use rand::Rng;

/// Iterations of erosion allowed per cell before giving up on the target
const EROSION_GUARD_FACTOR: usize = 100;

/// Wear down steep terrain. A cell is erodible when it towers at least two
/// levels over a neighbor; erosion moves one level of material from such a
/// cell down to the low neighbor, until only the configured share of the
/// erodible cells is left.
#[derive(Debug)]
pub struct ErosionGenerator;

impl Generate for ErosionGenerator {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()> {
        let cell_count = builder.grid.cells().len();
        // Insertion-ordered so random picks are deterministic
        let mut erodible: IndexSet<CellIndex, FnvBuildHasher> = (0..cell_count)
            .map(CellIndex)
            .filter(|&cell| is_erodible(builder.grid, cell))
            .collect();
        let target_count = erodible.len()
            * (100 - builder.config.erosion_percentage) as usize
            / 100;
        debug!(
            "Eroding from {} erodible cells down to {}",
            erodible.len(),
            target_count
        );

        let guard = cell_count * EROSION_GUARD_FACTOR;
        let mut iterations = 0;
        builder.report.erosion_converged = true;
        while erodible.len() > target_count {
            if iterations >= guard {
                warn!(
                    "Erosion stopped after {} iterations with {} erodible \
                    cells left (target {})",
                    iterations,
                    erodible.len(),
                    target_count
                );
                builder.report.erosion_converged = false;
                break;
            }
            iterations += 1;

            let index = builder.rng.gen_range(0..erodible.len());
            let cell = match erodible.get_index(index) {
                Some(&cell) => cell,
                None => break,
            };
            let target = match erosion_target(builder, cell) {
                Some(target) => target,
                None => {
                    erodible.swap_remove_index(index);
                    continue;
                }
            };
            erode(builder.grid, &mut erodible, index, cell, target);
        }
        Ok(())
    }
}

/// Move one level of elevation from `cell` (at `index` in the erodible set)
/// to `target`, then fix up the erodible set around both of them
fn erode(
    grid: &mut HexGrid,
    erodible: &mut IndexSet<CellIndex, FnvBuildHasher>,
    index: usize,
    cell: CellIndex,
    target: CellIndex,
) {
    let elevation = grid.cell(cell).elevation() - 1;
    let target_elevation = grid.cell(target).elevation() + 1;
    grid.set_elevation(cell, elevation);
    grid.set_elevation(target, target_elevation);

    if !is_erodible(grid, cell) {
        erodible.swap_remove_index(index);
    }
    // Neighbors that now tower over the lowered cell
    for (_, neighbor) in grid.cell(cell).neighbors() {
        if grid.cell(neighbor).elevation() == elevation + 2 {
            erodible.insert(neighbor);
        }
    }

    if is_erodible(grid, target) {
        erodible.insert(target);
    }
    // Neighbors the raised target has caught up with
    for (_, neighbor) in grid.cell(target).neighbors() {
        if neighbor != cell
            && grid.cell(neighbor).elevation() == target_elevation + 1
            && !is_erodible(grid, neighbor)
        {
            erodible.swap_remove(&neighbor);
        }
    }
}

fn is_erodible(grid: &HexGrid, cell: CellIndex) -> bool {
    let erodible_elevation = grid.cell(cell).elevation() - 2;
    grid.cell(cell).neighbors().any(|(_, neighbor)| {
        grid.cell(neighbor).elevation() <= erodible_elevation
    })
}

/// Pick a random neighbor at least two levels below the cell
fn erosion_target(
    builder: &mut MapBuilder<'_>,
    cell: CellIndex,
) -> Option<CellIndex> {
    let erodible_elevation = builder.grid.cell(cell).elevation() - 2;
    let candidates: Vec<CellIndex> = builder
        .grid
        .cell(cell)
        .neighbors()
        .map(|(_, neighbor)| neighbor)
        .filter(|&neighbor| {
            builder.grid.cell(neighbor).elevation() <= erodible_elevation
        })
        .collect();
    if candidates.is_empty() {
        None
    } else {
        let index = builder.rng.gen_range(0..candidates.len());
        Some(candidates[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GeneratorConfig, Seed},
        grid::tests::flat_grid,
    };

    #[test]
    fn test_is_erodible() {
        let mut grid = flat_grid(10, 10, false);
        let peak = grid.cell_at_offset(4, 4).unwrap();
        grid.set_elevation(peak, 1);
        assert!(!is_erodible(&grid, peak));
        grid.set_elevation(peak, 2);
        assert!(is_erodible(&grid, peak));
        assert!(!is_erodible(&grid, CellIndex(0)));
    }

    #[test]
    fn test_erosion_flattens_spike() {
        let config = GeneratorConfig {
            erosion_percentage: 100,
            ..Default::default()
        };
        let mut grid = flat_grid(10, 10, false);
        let peak = grid.cell_at_offset(4, 4).unwrap();
        grid.set_elevation(peak, 6);
        let total: i32 = grid.cells().iter().map(|c| c.elevation()).sum();

        let mut builder = MapBuilder::new(&config, Seed::Int(5), &mut grid);
        ErosionGenerator.generate(&mut builder).unwrap();
        assert!(builder.report.erosion_converged);

        // Material is moved, never created or destroyed
        let grid: &HexGrid = builder.grid;
        let after: i32 = grid.cells().iter().map(|c| c.elevation()).sum();
        assert_eq!(after, total);
        assert!(grid.cells().iter().all(|c| !is_erodible(grid, c.index())));
    }

    #[test]
    fn test_zero_percentage_is_noop() {
        let config = GeneratorConfig {
            erosion_percentage: 0,
            ..Default::default()
        };
        let mut grid = flat_grid(10, 10, false);
        let peak = grid.cell_at_offset(4, 4).unwrap();
        grid.set_elevation(peak, 6);

        let mut builder = MapBuilder::new(&config, Seed::Int(5), &mut grid);
        ErosionGenerator.generate(&mut builder).unwrap();
        assert_eq!(builder.grid.cell(peak).elevation(), 6);
    }
}
