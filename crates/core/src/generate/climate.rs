use crate::{
    config::GeneratorConfig,
    generate::{Generate, MapBuilder},
    grid::HexGrid,
};
use log::debug;
use serde::Serialize;
use std::mem;

/// Number of passes the climate simulation runs for
const CLIMATE_CYCLES: usize = 40;

/// Water carried by one cell during the climate simulation
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClimateCell {
    pub clouds: f64,
    /// In `[0, 1]`
    pub moisture: f64,
}

/// Simulate a simple water cycle: water evaporates into clouds, clouds blow
/// around with the wind and rain back down, and moisture runs off downhill.
/// The resulting moisture feeds river placement and biomes.
#[derive(Debug)]
pub struct ClimateGenerator;

impl Generate for ClimateGenerator {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()> {
        let config = builder.config;
        let cell_count = builder.grid.cells().len();
        let mut climate = vec![
            ClimateCell {
                clouds: 0.0,
                moisture: config.starting_moisture,
            };
            cell_count
        ];
        let mut next = vec![ClimateCell::default(); cell_count];

        for _ in 0..CLIMATE_CYCLES {
            for i in 0..cell_count {
                evolve_climate(builder.grid, config, i, &mut climate, &mut next);
            }
            mem::swap(&mut climate, &mut next);
        }

        debug!(
            "Mean moisture after {} cycles: {:.3}",
            CLIMATE_CYCLES,
            climate.iter().map(|c| c.moisture).sum::<f64>() / cell_count as f64
        );
        builder.climate = climate;
        Ok(())
    }
}

/// Run one cycle for one cell, reading from `climate` and accumulating into
/// `next`. The cell's entry in `climate` is cleared so the buffers can be
/// swapped afterwards.
fn evolve_climate(
    grid: &HexGrid,
    config: &GeneratorConfig,
    index: usize,
    climate: &mut [ClimateCell],
    next: &mut [ClimateCell],
) {
    let cell = &grid.cells()[index];
    let mut current = climate[index];

    if cell.is_underwater() {
        current.moisture = 1.0;
        current.clouds += config.evaporation_factor;
    } else {
        let evaporation = current.moisture * config.evaporation_factor;
        current.moisture -= evaporation;
        current.clouds += evaporation;
    }

    let precipitation = current.clouds * config.precipitation_factor;
    current.clouds -= precipitation;
    current.moisture += precipitation;

    // Thin air at altitude can't hold as much cloud
    let cloud_maximum = 1.0
        - cell.view_elevation() as f64
            / (config.elevation_maximum as f64 + 1.0);
    if current.clouds > cloud_maximum {
        current.moisture += current.clouds - cloud_maximum;
        current.clouds = cloud_maximum;
    }

    let main_dispersal_direction = config.wind_direction.opposite();
    let cloud_dispersal = current.clouds / (5.0 + config.wind_strength);
    let runoff = current.moisture * config.runoff_factor / 6.0;
    let seepage = current.moisture * config.seepage_factor / 6.0;
    for (direction, neighbor) in cell.neighbors() {
        let neighbor_cell = grid.cell(neighbor);
        let neighbor_climate = &mut next[neighbor.0];
        if direction == main_dispersal_direction {
            neighbor_climate.clouds += cloud_dispersal * config.wind_strength;
        } else {
            neighbor_climate.clouds += cloud_dispersal;
        }

        let elevation_delta =
            neighbor_cell.view_elevation() - cell.view_elevation();
        if elevation_delta < 0 {
            current.moisture -= runoff;
            neighbor_climate.moisture += runoff;
        } else if elevation_delta == 0 {
            current.moisture -= seepage;
            neighbor_climate.moisture += seepage;
        }
    }

    let next_cell = &mut next[index];
    next_cell.moisture = (next_cell.moisture + current.moisture).min(1.0);
    climate[index] = ClimateCell::default();
}
