//! Procedural map generation. A [MapGenerator] wipes a [HexGrid] and runs a
//! fixed sequence of stages over it, each one building on what the previous
//! ones left behind: regions, land, erosion, climate, rivers and finally
//! biomes.

mod biome;
mod climate;
mod erosion;
mod land;
mod region;
mod river;

pub use climate::ClimateCell;
pub use region::MapRegion;

use crate::{
    config::{GeneratorConfig, Seed},
    generate::{
        biome::BiomeGenerator, climate::ClimateGenerator,
        erosion::ErosionGenerator, land::LandGenerator,
        region::RegionGenerator, river::RiverGenerator,
    },
    grid::{CellIndex, HexGrid},
    timed,
};
use anyhow::Context;
use log::info;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::Serialize;
use std::fmt::Debug;
use validator::Validate;

/// Summary of one generation run. Land and river amounts are soft targets,
/// so a run can finish with some budget left over.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    /// The seed the RNG was actually built from
    pub seed: Seed,
    /// Cells raised above water
    pub land_cells: i32,
    /// Land cells that were asked for but couldn't be raised
    pub unused_land_budget: i32,
    /// River length that was asked for but couldn't be placed
    pub unused_river_budget: i32,
    /// Did erosion reach its target before hitting the iteration cap?
    pub erosion_converged: bool,
    /// Where land was allowed to grow
    pub regions: Vec<MapRegion>,
}

/// Generates maps from a fixed config. The same generator can be reused for
/// any number of maps.
#[derive(Clone, Debug)]
pub struct MapGenerator {
    config: GeneratorConfig,
}

impl MapGenerator {
    /// Create a generator. Fails if the config is invalid, in which case the
    /// error wraps the [validator::ValidationErrors].
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid config")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Replace the contents of `grid` with a fresh `width × height` map. If
    /// the generator isn't set to a fixed seed, a new random seed is picked
    /// for this run; either way the seed used is in the returned report.
    ///
    /// Fails if the map size isn't supported, in which case the grid is left
    /// untouched.
    pub fn generate_map(
        &self,
        grid: &mut HexGrid,
        width: i32,
        height: i32,
        wrapping: bool,
    ) -> anyhow::Result<GenerationReport> {
        let seed = if self.config.use_fixed_seed {
            self.config.seed.clone()
        } else {
            Seed::random()
        };
        info!("Generating {}x{} map with seed {}", width, height, seed);

        grid.create_map(width, height, wrapping)?;
        for i in 0..grid.cells().len() {
            grid.set_water_level(CellIndex(i), self.config.water_level);
        }

        let mut builder = MapBuilder::new(&self.config, seed, grid);
        // Order matters! Each stage reads what the previous ones produced.
        builder.apply_generator(RegionGenerator)?;
        builder.apply_generator(LandGenerator)?;
        builder.apply_generator(ErosionGenerator)?;
        builder.apply_generator(ClimateGenerator)?;
        builder.apply_generator(RiverGenerator)?;
        builder.apply_generator(BiomeGenerator)?;
        let MapBuilder {
            regions,
            mut report,
            ..
        } = builder;
        report.regions = regions;

        grid.reset_search();
        info!(
            "Generated map with {} land cells (unused land budget: {}, \
            unused river budget: {})",
            report.land_cells,
            report.unused_land_budget,
            report.unused_river_budget
        );
        Ok(report)
    }
}

/// Shared state for one generation run. The fields are public to the stages
/// so they can borrow several of them at once.
pub struct MapBuilder<'a> {
    /// Do **not** mutate the config
    pub config: &'a GeneratorConfig,
    pub rng: Pcg64,
    pub grid: &'a mut HexGrid,
    /// Areas land is grown in. Populated by [RegionGenerator].
    pub regions: Vec<MapRegion>,
    /// Final climate of each cell, indexed like the grid's cells. Populated
    /// by [ClimateGenerator].
    pub climate: Vec<ClimateCell>,
    pub report: GenerationReport,
}

impl<'a> MapBuilder<'a> {
    fn new(
        config: &'a GeneratorConfig,
        seed: Seed,
        grid: &'a mut HexGrid,
    ) -> Self {
        Self {
            config,
            rng: Pcg64::seed_from_u64(seed.to_u64()),
            grid,
            regions: Vec::new(),
            climate: Vec::new(),
            report: GenerationReport {
                seed,
                ..Default::default()
            },
        }
    }

    /// A helper to run a generation step on this builder.
    fn apply_generator(
        &mut self,
        generator: impl Debug + Generate,
    ) -> anyhow::Result<()> {
        timed!(&format!("{:?}", generator), generator.generate(self))
            .with_context(|| format!("error in {:?}", generator))
    }

    /// Uniform value in `[0, 1)`
    pub fn random_value(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform integer in `[min, max)`. An empty range yields `min`.
    pub fn random_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            min
        } else {
            self.rng.gen_range(min..max)
        }
    }

    /// Pick a random cell inside a region. Regions squeezed by large borders
    /// can end up empty or reach past the map, so the result is clamped onto
    /// the grid.
    pub fn random_cell(&mut self, region: MapRegion) -> CellIndex {
        let col = self
            .random_range(region.x_min, region.x_max)
            .clamp(0, self.grid.width() - 1);
        let row = self
            .random_range(region.z_min, region.z_max)
            .clamp(0, self.grid.height() - 1);
        CellIndex((col + row * self.grid.width()) as usize)
    }
}

/// One stage of map generation. A stage mutates the grid (and the builder's
/// intermediate data) but never resizes it. Failures are internal errors,
/// since every valid config must produce a map.
trait Generate {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()>;
}
