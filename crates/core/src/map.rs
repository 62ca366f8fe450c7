use crate::{
    config::MapConfig,
    generate::{GenerationReport, MapGenerator},
    grid::HexGrid,
    noise::NoiseContext,
    timed,
};
use anyhow::Context;
use log::info;
use std::sync::Arc;
use validator::Validate;

/// A generated map, along with the config that produced it and a summary of
/// the generation run. The grid stays editable afterwards: units can be
/// placed, paths found and cells changed.
pub struct HexMap {
    /// The config used to generate this map. With a fixed generator seed,
    /// generation is deterministic based on this config.
    config: MapConfig,
    grid: HexGrid,
    report: GenerationReport,
}

impl HexMap {
    /// Generate a new map. Returns an error if the config is invalid; the
    /// error then wraps the [validator::ValidationErrors]. Panics only in the
    /// case of internal bugs in the generation algorithm.
    pub fn generate(config: MapConfig) -> anyhow::Result<Self> {
        info!("Generating map with config {:#?}", config);
        config.validate().context("invalid config")?;

        let noise = Arc::new(timed!(
            "Noise initialization",
            NoiseContext::new(config.noise_seed.to_u64())
        ));
        let mut grid =
            HexGrid::new(config.width, config.height, config.wrapping, noise)?;
        let generator = MapGenerator::new(config.generator.clone())?;
        let report = timed!(
            "Map generation",
            log::Level::Info,
            generator.generate_map(
                &mut grid,
                config.width,
                config.height,
                config.wrapping
            )
        )?;

        Ok(Self {
            config,
            grid,
            report,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut HexGrid {
        &mut self.grid
    }

    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Take ownership of the grid, dropping everything else
    pub fn into_grid(self) -> HexGrid {
        self.grid
    }
}
