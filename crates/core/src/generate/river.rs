use crate::{
    generate::{Generate, MapBuilder},
    grid::CellIndex,
    hex::HexDirection,
};
use log::{debug, warn};
use rand::Rng;

/// Carve rivers down from wet highlands. Rivers start at cells picked with a
/// bias toward high, moist ground and flow downhill until they reach water,
/// join another river or get stuck in a depression, which becomes a lake.
#[derive(Debug)]
pub struct RiverGenerator;

impl Generate for RiverGenerator {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()> {
        let mut origins = river_origins(builder);
        let mut budget = (builder.report.land_cells as f64
            * builder.config.river_percentage as f64
            * 0.01)
            .round() as i32;
        debug!(
            "River budget {} across {} origin tickets",
            budget,
            origins.len()
        );

        let mut rivers = 0;
        while budget > 0 && !origins.is_empty() {
            let index = builder.rng.gen_range(0..origins.len());
            let origin = origins.swap_remove(index);
            if is_valid_origin(builder, origin) {
                let length = create_river(builder, origin);
                if length > 0 {
                    rivers += 1;
                }
                budget -= length;
            }
        }

        if budget > 0 {
            warn!("Failed to use up {} river budget", budget);
        }
        debug!("Created {} rivers", rivers);
        builder.report.unused_river_budget = budget.max(0);
        Ok(())
    }
}

/// Weighted list of cells rivers could start from. Each dry cell gets up to
/// four tickets depending on how high and wet it is.
fn river_origins(builder: &MapBuilder<'_>) -> Vec<CellIndex> {
    let config = builder.config;
    let elevation_range =
        (config.elevation_maximum - config.water_level) as f64;
    let mut origins = Vec::new();
    for cell in builder.grid.cells() {
        if cell.is_underwater() {
            continue;
        }
        let moisture = builder.climate[cell.index().0].moisture;
        let weight = moisture
            * (cell.elevation() - config.water_level) as f64
            / elevation_range;
        let tickets = match weight {
            w if w > 0.75 => 4,
            w if w > 0.5 => 2,
            w if w > 0.25 => 1,
            _ => 0,
        };
        origins.extend((0..tickets).map(|_| cell.index()));
    }
    origins
}

/// A river can only start somewhere with no river or water around it
fn is_valid_origin(builder: &MapBuilder<'_>, origin: CellIndex) -> bool {
    let cell = builder.grid.cell(origin);
    !cell.has_river()
        && cell.neighbors().all(|(_, neighbor)| {
            let neighbor = builder.grid.cell(neighbor);
            !neighbor.has_river() && !neighbor.is_underwater()
        })
}

/// Run a river from `origin` until it ends somewhere. Returns its length in
/// cells, or 0 if it couldn't flow anywhere at all.
fn create_river(builder: &mut MapBuilder<'_>, origin: CellIndex) -> i32 {
    let extra_lake_probability = builder.config.extra_lake_probability;
    let max_length = builder.grid.cells().len();
    let mut flow_directions = Vec::with_capacity(24);
    let mut length = 1;
    let mut cell = origin;
    let mut direction = HexDirection::NorthEast;

    while !builder.grid.cell(cell).is_underwater() {
        if length as usize > max_length {
            break;
        }

        // Collect the possible directions, weighted
        flow_directions.clear();
        let mut min_neighbor_elevation = i32::MAX;
        let mut join = None;
        let current = builder.grid.cell(cell);
        for (d, neighbor) in current.neighbors() {
            let neighbor_cell = builder.grid.cell(neighbor);
            min_neighbor_elevation =
                min_neighbor_elevation.min(neighbor_cell.elevation());
            if neighbor == origin || neighbor_cell.incoming_river().is_some() {
                continue;
            }
            let delta = neighbor_cell.elevation() - current.elevation();
            if delta > 0 {
                continue;
            }
            if neighbor_cell.outgoing_river().is_some() {
                join = Some(d);
                break;
            }

            // Strongly prefer going downhill
            if delta < 0 {
                flow_directions.extend_from_slice(&[d, d, d]);
            }
            // Avoid sharp turns
            let sharp_turn =
                d == direction.next2() || d == direction.previous2();
            if length == 1 || !sharp_turn {
                flow_directions.push(d);
            }
            flow_directions.push(d);
        }

        if let Some(d) = join {
            builder.grid.set_outgoing_river(cell, d);
            return length;
        }

        let elevation = builder.grid.cell(cell).elevation();
        if flow_directions.is_empty() {
            if length == 1 {
                return 0;
            }
            // Stuck in a depression, fill it
            if min_neighbor_elevation >= elevation {
                builder.grid.set_water_level(cell, min_neighbor_elevation);
                if min_neighbor_elevation == elevation {
                    builder.grid.set_elevation(cell, elevation - 1);
                }
            }
            break;
        }

        direction =
            flow_directions[builder.rng.gen_range(0..flow_directions.len())];
        builder.grid.set_outgoing_river(cell, direction);
        length += 1;

        // Occasionally leave a lake behind on flat ground
        if min_neighbor_elevation >= elevation
            && builder.random_value() < extra_lake_probability
        {
            builder.grid.set_water_level(cell, elevation);
            builder.grid.set_elevation(cell, elevation - 1);
        }

        cell = match builder.grid.neighbor(cell, direction) {
            Some(next) => next,
            None => break,
        };
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GeneratorConfig, Seed},
        generate::ClimateCell,
        grid::{tests::flat_grid, HexGrid},
    };

    fn assert_rivers_consistent(grid: &HexGrid) {
        for cell in grid.cells() {
            if let Some(direction) = cell.outgoing_river() {
                let neighbor = grid.neighbor(cell.index(), direction).unwrap();
                assert_eq!(
                    grid.cell(neighbor).incoming_river(),
                    Some(direction.opposite())
                );
            }
        }
    }

    /// A slope rising from west to east with a sea on the west edge
    fn slope() -> HexGrid {
        let mut grid = flat_grid(20, 15, false);
        for i in 0..grid.cells().len() {
            let cell = CellIndex(i);
            let (col, _) = grid.cell(cell).coordinates().to_offset();
            grid.set_water_level(cell, 1);
            grid.set_elevation(cell, col / 2);
        }
        grid
    }

    #[test]
    fn test_river_flows_to_sea() {
        let config = GeneratorConfig::default();
        let mut grid = slope();
        let mut builder = MapBuilder::new(&config, Seed::Int(9), &mut grid);
        let origin = builder.grid.cell_at_offset(15, 7).unwrap();

        let length = create_river(&mut builder, origin);
        assert!(length > 1);
        assert!(builder.grid.cell(origin).outgoing_river().is_some());
        assert_rivers_consistent(builder.grid);

        // Follow the river down to where it ends
        let mut cell = origin;
        let mut steps = 1;
        while let Some(direction) = builder.grid.cell(cell).outgoing_river() {
            cell = builder.grid.neighbor(cell, direction).unwrap();
            steps += 1;
        }
        assert_eq!(steps, length);
        assert!(builder.grid.cell(cell).is_underwater());
    }

    #[test]
    fn test_river_needs_downhill() {
        let config = GeneratorConfig::default();
        let mut grid = flat_grid(20, 15, false);
        let origin = grid.cell_at_offset(10, 7).unwrap();
        grid.set_elevation(origin, 1);
        for (_, neighbor) in grid.cell(origin).neighbors().collect::<Vec<_>>() {
            grid.set_elevation(neighbor, 3);
        }

        let mut builder = MapBuilder::new(&config, Seed::Int(9), &mut grid);
        assert_eq!(create_river(&mut builder, origin), 0);
        assert!(!builder.grid.cell(origin).has_river());
    }

    #[test]
    fn test_origin_tickets() {
        let config = GeneratorConfig {
            water_level: 2,
            elevation_maximum: 10,
            ..Default::default()
        };
        let mut grid = flat_grid(10, 10, false);
        let high = grid.cell_at_offset(4, 4).unwrap();
        let mid = grid.cell_at_offset(6, 6).unwrap();
        grid.set_elevation(high, 10);
        grid.set_elevation(mid, 6);

        let mut builder = MapBuilder::new(&config, Seed::Int(9), &mut grid);
        builder.climate = vec![
            ClimateCell {
                clouds: 0.0,
                moisture: 1.0
            };
            100
        ];
        let origins = river_origins(&builder);
        assert_eq!(origins.iter().filter(|&&c| c == high).count(), 4);
        // Weight exactly 0.5 isn't above the second tier
        assert_eq!(origins.iter().filter(|&&c| c == mid).count(), 1);
        assert_eq!(origins.len(), 5);
    }
}
