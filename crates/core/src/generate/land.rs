use crate::{
    generate::{Generate, MapBuilder, MapRegion},
    grid::CellIndex,
    search::{SearchData, VisitState},
};
use log::{debug, warn};

/// Maximum number of rounds of chunk placement before giving up on the land
/// budget
const LAND_GUARD: usize = 10_000;

/// Raise continents out of the water by repeatedly lifting (and sometimes
/// sinking) roughly round chunks of cells, until the configured share of the
/// map is land.
#[derive(Debug)]
pub struct LandGenerator;

impl Generate for LandGenerator {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()> {
        let config = builder.config;
        let cell_count = builder.grid.cells().len() as f64;
        let land_target =
            (cell_count * config.land_percentage as f64 * 0.01).round() as i32;
        let mut budget = land_target;

        'rounds: for _ in 0..LAND_GUARD {
            let sink = builder.random_value() < config.sink_probability;
            for i in 0..builder.regions.len() {
                let region = builder.regions[i];
                let chunk_size = builder
                    .random_range(config.chunk_size_min, config.chunk_size_max - 1);
                if sink {
                    budget = shift_chunk(
                        builder,
                        region,
                        chunk_size,
                        budget,
                        Shift::Sink,
                    );
                } else {
                    budget = shift_chunk(
                        builder,
                        region,
                        chunk_size,
                        budget,
                        Shift::Raise,
                    );
                    if budget == 0 {
                        break 'rounds;
                    }
                }
            }
        }

        if budget > 0 {
            warn!("Failed to use up {} land budget", budget);
        }
        let unused = budget.max(0);
        builder.report.land_cells = land_target - unused;
        builder.report.unused_land_budget = unused;
        debug!("Raised {} land cells", builder.report.land_cells);
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Shift {
    Raise,
    Sink,
}

/// Grow one chunk from a random cell in `region`, moving every cell in it up
/// or down by one or two levels. Cells grow outward in order of distance from
/// the first cell, with a bit of jitter. Cells that would leave the
/// configured elevation range are skipped.
///
/// Returns the updated land budget: each cell that rises out of the water
/// spends one, each one that sinks below refunds one. Raising stops as soon
/// as the budget hits zero.
fn shift_chunk(
    builder: &mut MapBuilder<'_>,
    region: MapRegion,
    chunk_size: i32,
    mut budget: i32,
    shift: Shift,
) -> i32 {
    let config = builder.config;
    let water_level = config.water_level;
    let wrap_size = builder.grid.wrap_size();

    let first = builder.random_cell(region);
    let phase = builder.grid.frontier.begin();
    let center = builder.grid.cell(first).coordinates();
    builder.grid.cells[first.0].search = SearchData {
        phase,
        ..Default::default()
    };
    builder.grid.frontier.queue.enqueue(first, 0);

    let step = if builder.random_value() < config.high_rise_probability {
        2
    } else {
        1
    };
    let mut size = 0;
    while size < chunk_size {
        let current = match builder.grid.frontier.queue.dequeue() {
            Some(current) => current,
            None => break,
        };
        let original = builder.grid.cell(current).elevation();
        let elevation = match shift {
            Shift::Raise => original + step,
            Shift::Sink => original - step,
        };
        if elevation > config.elevation_maximum
            || elevation < config.elevation_minimum
        {
            continue;
        }

        builder.grid.set_elevation(current, elevation);
        match shift {
            Shift::Raise => {
                if original < water_level && elevation >= water_level {
                    budget -= 1;
                    if budget == 0 {
                        break;
                    }
                }
            }
            Shift::Sink => {
                if original >= water_level && elevation < water_level {
                    budget += 1;
                }
            }
        }
        size += 1;

        let neighbors: Vec<CellIndex> = builder
            .grid
            .cell(current)
            .neighbors()
            .map(|(_, neighbor)| neighbor)
            .collect();
        for neighbor in neighbors {
            let cell = builder.grid.cell(neighbor);
            if cell.search.phase.visit_state(phase) != VisitState::Unvisited {
                continue;
            }
            let distance = cell.coordinates().distance_to(center, wrap_size);
            let heuristic =
                if builder.random_value() < config.jitter_probability {
                    1
                } else {
                    0
                };
            builder.grid.cells[neighbor.0].search = SearchData {
                phase,
                distance,
                heuristic,
                path_from: None,
            };
            builder.grid.frontier.queue.enqueue(neighbor, distance + heuristic);
        }
    }

    builder.grid.frontier.queue.clear();
    budget
}
