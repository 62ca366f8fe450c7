use crate::{
    config::{GeneratorConfig, HemisphereMode},
    generate::{Generate, MapBuilder},
    grid::{CellIndex, HexCell, HexGrid, TerrainType},
    noise::NOISE_CHANNELS,
    util,
};
use log::debug;
use rand::Rng;

/// Upper bounds of the first three temperature bands. Anything warmer falls
/// in the fourth.
const TEMPERATURE_BANDS: [f64; 3] = [0.1, 0.3, 0.6];

/// Upper bounds of the first three moisture bands
const MOISTURE_BANDS: [f64; 3] = [0.12, 0.28, 0.85];

/// Terrain and vegetation for a temperature/moisture pair
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Biome {
    terrain: TerrainType,
    plant: u8,
}

const fn biome(terrain: TerrainType, plant: u8) -> Biome {
    Biome { terrain, plant }
}

/// Indexed by `[temperature band][moisture band]`
const BIOMES: [[Biome; 4]; 4] = {
    use TerrainType::*;
    [
        [biome(Sand, 0), biome(Snow, 0), biome(Snow, 0), biome(Snow, 0)],
        [biome(Sand, 0), biome(Mud, 0), biome(Mud, 1), biome(Mud, 2)],
        [biome(Sand, 0), biome(Grass, 0), biome(Grass, 1), biome(Grass, 2)],
        [biome(Sand, 0), biome(Grass, 1), biome(Grass, 2), biome(Grass, 3)],
    ]
};

/// Index of the first band `value` falls under
fn band(bands: &[f64], value: f64) -> usize {
    bands
        .iter()
        .position(|&bound| value < bound)
        .unwrap_or(bands.len())
}

/// Pick terrain and vegetation for every cell, based on its temperature and
/// moisture. Submerged cells get their terrain from depth and shoreline
/// shape instead.
#[derive(Debug)]
pub struct BiomeGenerator;

impl Generate for BiomeGenerator {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()> {
        let config = builder.config;
        let jitter_channel = builder.rng.gen_range(0..NOISE_CHANNELS);
        let rock_desert_elevation = config.elevation_maximum
            - (config.elevation_maximum - config.water_level) / 2;

        let mut snow = 0;
        for i in 0..builder.grid.cells().len() {
            let index = CellIndex(i);
            let cell = builder.grid.cell(index);
            let temperature =
                cell_temperature(builder.grid, config, cell, jitter_channel);

            if cell.is_underwater() {
                let terrain =
                    underwater_terrain(builder.grid, config, cell, temperature);
                builder.grid.set_terrain_type(index, terrain);
                continue;
            }

            let moisture = builder.climate[i].moisture;
            let mut biome = BIOMES[band(&TEMPERATURE_BANDS, temperature)]
                [band(&MOISTURE_BANDS, moisture)];
            if biome.terrain == TerrainType::Sand {
                if cell.elevation() >= rock_desert_elevation {
                    biome.terrain = TerrainType::Stone;
                }
            } else if cell.elevation() == config.elevation_maximum {
                biome.terrain = TerrainType::Snow;
            }

            if biome.terrain == TerrainType::Snow {
                biome.plant = 0;
                snow += 1;
            } else if biome.plant < 3 && cell.has_river() {
                biome.plant += 1;
            }

            builder.grid.set_terrain_type(index, biome.terrain);
            builder.grid.set_plant_level(index, biome.plant);
        }
        debug!("{} snow cells", snow);
        Ok(())
    }
}

/// Temperature of a cell, roughly in `[0, 1]`. Depends on latitude, height
/// above the water and a bit of noise.
fn cell_temperature(
    grid: &HexGrid,
    config: &GeneratorConfig,
    cell: &HexCell,
    jitter_channel: usize,
) -> f64 {
    let mut latitude = cell.coordinates().z() as f64 / grid.height() as f64;
    match config.hemisphere {
        HemisphereMode::Both => {
            latitude *= 2.0;
            if latitude > 1.0 {
                latitude = 2.0 - latitude;
            }
        }
        HemisphereMode::North => latitude = 1.0 - latitude,
        HemisphereMode::South => {}
    }

    let mut temperature =
        util::lerp(config.low_temperature, config.high_temperature, latitude);
    temperature *= 1.0
        - (cell.view_elevation() - config.water_level) as f64
            / ((config.elevation_maximum - config.water_level) as f64 + 1.0);

    let jitter = grid
        .noise()
        .sample_noise(&(cell.position() * 0.1), grid.wrap_size())
        [jitter_channel];
    temperature + (jitter * 2.0 - 1.0) * config.temperature_jitter
}

/// Terrain for a submerged cell. Shallow water near the shore is sand or
/// grass on gentle coasts and stone under cliffs; deeper water is mud, and
/// the deepest trenches stone.
fn underwater_terrain(
    grid: &HexGrid,
    config: &GeneratorConfig,
    cell: &HexCell,
    temperature: f64,
) -> TerrainType {
    let terrain = if cell.elevation() == config.water_level - 1 {
        let mut cliffs = 0;
        let mut slopes = 0;
        for (_, neighbor) in cell.neighbors() {
            let delta = grid.cell(neighbor).elevation() - cell.water_level();
            if delta == 0 {
                slopes += 1;
            } else if delta > 0 {
                cliffs += 1;
            }
        }

        if cliffs + slopes > 3 {
            TerrainType::Grass
        } else if cliffs > 0 {
            TerrainType::Stone
        } else if slopes > 0 {
            TerrainType::Sand
        } else {
            TerrainType::Grass
        }
    } else if cell.elevation() >= config.water_level {
        // A lake above sea level
        TerrainType::Grass
    } else if cell.elevation() < 0 {
        TerrainType::Stone
    } else {
        TerrainType::Mud
    };

    // Too cold for plants
    if terrain == TerrainType::Grass && temperature < TEMPERATURE_BANDS[0] {
        TerrainType::Mud
    } else {
        terrain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Seed, generate::ClimateCell, grid::tests::flat_grid};

    #[test]
    fn test_band() {
        assert_eq!(band(&TEMPERATURE_BANDS, 0.0), 0);
        assert_eq!(band(&TEMPERATURE_BANDS, 0.1), 1);
        assert_eq!(band(&TEMPERATURE_BANDS, 0.59), 2);
        assert_eq!(band(&TEMPERATURE_BANDS, 0.6), 3);
        assert_eq!(band(&MOISTURE_BANDS, 1.0), 3);
    }

    #[test]
    fn test_temperature_by_hemisphere() {
        let grid = flat_grid(20, 30, false);
        let mut config = GeneratorConfig {
            temperature_jitter: 0.0,
            water_level: 0,
            ..Default::default()
        };
        let south = grid.cell(grid.cell_at_offset(5, 0).unwrap());
        let middle = grid.cell(grid.cell_at_offset(5, 15).unwrap());
        let north = grid.cell(grid.cell_at_offset(5, 29).unwrap());
        let temperature = |config: &GeneratorConfig, cell: &HexCell| {
            cell_temperature(&grid, config, cell, 0)
        };

        // Hot at the equator, cold at the poles
        assert!(temperature(&config, middle) > 0.9);
        assert!(temperature(&config, south) < 0.1);
        assert!(temperature(&config, north) < 0.1);

        config.hemisphere = HemisphereMode::North;
        assert!(temperature(&config, south) > 0.9);
        assert!(temperature(&config, north) < 0.1);

        config.hemisphere = HemisphereMode::South;
        assert!(temperature(&config, south) < 0.1);
        assert!(temperature(&config, north) > 0.9);
    }

    #[test]
    fn test_biomes() {
        let config = GeneratorConfig {
            temperature_jitter: 0.0,
            water_level: 1,
            elevation_maximum: 6,
            ..Default::default()
        };
        let mut grid = flat_grid(20, 30, false);
        for i in 0..grid.cells().len() {
            grid.set_water_level(CellIndex(i), 1);
            grid.set_elevation(CellIndex(i), 1);
        }
        let peak = grid.cell_at_offset(5, 15).unwrap();
        grid.set_elevation(peak, 6);
        let lake = grid.cell_at_offset(10, 15).unwrap();
        grid.set_elevation(lake, 0);

        let mut builder = MapBuilder::new(&config, Seed::Int(2), &mut grid);
        builder.climate = vec![
            ClimateCell {
                clouds: 0.0,
                moisture: 0.5
            };
            600
        ];
        BiomeGenerator.generate(&mut builder).unwrap();

        let grid = &builder.grid;
        let equator = grid.cell(grid.cell_at_offset(0, 15).unwrap());
        assert_eq!(equator.terrain_type(), TerrainType::Grass);
        assert_eq!(equator.plant_level(), 2);
        let pole = grid.cell(grid.cell_at_offset(0, 0).unwrap());
        assert_eq!(pole.terrain_type(), TerrainType::Snow);
        assert_eq!(pole.plant_level(), 0);
        // Mountain tops are always snowy
        assert_eq!(grid.cell(peak).terrain_type(), TerrainType::Snow);
        // Shallow water with gentle shores all around
        assert_eq!(grid.cell(lake).terrain_type(), TerrainType::Grass);
    }
}
