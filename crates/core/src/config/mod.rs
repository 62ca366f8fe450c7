mod seed;

pub use seed::Seed;

use crate::hex::{metrics, HexDirection};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::{Validate, ValidationError};

/// Configuration for a full map: its shape, the seed for the shared noise
/// context, and the generator settings. Two maps generated from the same
/// config (with a fixed generator seed) are always identical.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_map_size"))]
pub struct MapConfig {
    /// Number of cell columns. Must be a positive multiple of the chunk
    /// width.
    pub width: i32,

    /// Number of cell rows. Must be a positive multiple of the chunk height.
    pub height: i32,

    /// Should the east edge of the map connect to the west edge?
    pub wrapping: bool,

    /// Seed for the noise context, which drives cell perturbation and
    /// temperature jitter. Independent of the generator seed.
    pub noise_seed: Seed,

    /// Settings for the map generator
    #[validate]
    pub generator: GeneratorConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            wrapping: false,
            noise_seed: Seed::Int(1234),
            generator: GeneratorConfig::default(),
        }
    }
}

fn validate_map_size(config: &MapConfig) -> Result<(), ValidationError> {
    if metrics::is_supported_map_size(config.width, config.height) {
        Ok(())
    } else {
        Err(ValidationError::new("unsupported_map_size"))
    }
}

/// Which half of the globe the map represents. Controls how latitude maps to
/// temperature.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HemisphereMode {
    /// Cold at both the top and bottom, hot in the middle
    Both,
    /// Hot at the bottom, cold at the top
    North,
    /// Hot at the top, cold at the bottom
    South,
}

/// Settings for the map generator. Percentages are whole numbers in
/// `[0, 100]`, probabilities and factors are fractions in `[0, 1]`.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_generator"))]
pub struct GeneratorConfig {
    /// If false, a fresh random seed is picked for every generation and
    /// [seed](Self::seed) is ignored.
    pub use_fixed_seed: bool,

    /// Seed for every random choice made during generation, used only when
    /// [use_fixed_seed](Self::use_fixed_seed) is set.
    pub seed: Seed,

    /// Chance that a cell grown into a land chunk gets a small priority
    /// boost, which makes chunk shapes less round.
    #[validate(range(min = 0.0, max = 0.5))]
    pub jitter_probability: f64,

    /// Smallest number of cells in one raised or sunk chunk
    #[validate(range(min = 20, max = 200))]
    pub chunk_size_min: i32,

    /// Upper bound (exclusive, minus one) on the cells in one chunk
    #[validate(range(min = 20, max = 200))]
    pub chunk_size_max: i32,

    /// Percentage of cells that should end up above water
    #[validate(range(min = 5, max = 95))]
    pub land_percentage: i32,

    /// Water level of every cell before land is raised
    #[validate(range(min = 1, max = 5))]
    pub water_level: i32,

    /// Chance that a raised chunk goes up two levels instead of one
    #[validate(range(min = 0.0, max = 1.0))]
    pub high_rise_probability: f64,

    /// Chance that a chunk sinks instead of rising
    #[validate(range(min = 0.0, max = 0.4))]
    pub sink_probability: f64,

    /// Lowest elevation a sinking chunk may reach, in `[-4, 0]`
    #[validate(range(max = 0))]
    pub elevation_minimum: i32,

    /// Highest elevation a raised chunk may reach
    #[validate(range(min = 6, max = 10))]
    pub elevation_maximum: i32,

    /// Columns kept free of land along the east and west edges
    #[validate(range(min = 0, max = 10))]
    pub map_border_x: i32,

    /// Rows kept free of land along the north and south edges
    #[validate(range(min = 0, max = 10))]
    pub map_border_z: i32,

    /// Gap kept between adjacent regions
    #[validate(range(min = 0, max = 10))]
    pub region_border: i32,

    /// Number of separate regions land grows in
    #[validate(range(min = 1, max = 4))]
    pub region_count: i32,

    /// Percentage of erodible cells that erosion should smooth away
    #[validate(range(min = 0, max = 100))]
    pub erosion_percentage: i32,

    /// Moisture every cell starts the climate simulation with
    #[validate(range(min = 0.0, max = 1.0))]
    pub starting_moisture: f64,

    /// Fraction of moisture that evaporates into clouds each cycle
    #[validate(range(min = 0.0, max = 1.0))]
    pub evaporation_factor: f64,

    /// Fraction of clouds that precipitate into moisture each cycle
    #[validate(range(min = 0.0, max = 1.0))]
    pub precipitation_factor: f64,

    /// Fraction of moisture that flows to each lower neighbor
    #[validate(range(min = 0.0, max = 1.0))]
    pub runoff_factor: f64,

    /// Fraction of moisture that seeps to each neighbor of equal height
    #[validate(range(min = 0.0, max = 1.0))]
    pub seepage_factor: f64,

    /// Direction the prevailing wind blows from
    pub wind_direction: HexDirection,

    /// How much more cloud is pushed downwind than to other neighbors
    #[validate(range(min = 1.0, max = 10.0))]
    pub wind_strength: f64,

    /// Total river length, as a percentage of land cells
    #[validate(range(min = 0, max = 20))]
    pub river_percentage: i32,

    /// Chance that a river passing a local depression leaves a lake behind
    #[validate(range(min = 0.0, max = 1.0))]
    pub extra_lake_probability: f64,

    /// Temperature at the coldest latitude
    #[validate(range(min = 0.0, max = 1.0))]
    pub low_temperature: f64,

    /// Temperature at the hottest latitude
    #[validate(range(min = 0.0, max = 1.0))]
    pub high_temperature: f64,

    pub hemisphere: HemisphereMode,

    /// Amplitude of the noise added to each cell's temperature
    #[validate(range(min = 0.0, max = 1.0))]
    pub temperature_jitter: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            use_fixed_seed: false,
            seed: Seed::default(),
            jitter_probability: 0.25,
            chunk_size_min: 30,
            chunk_size_max: 100,
            land_percentage: 50,
            water_level: 3,
            high_rise_probability: 0.25,
            sink_probability: 0.2,
            elevation_minimum: -2,
            elevation_maximum: 8,
            map_border_x: 5,
            map_border_z: 5,
            region_border: 5,
            region_count: 1,
            erosion_percentage: 50,
            starting_moisture: 0.1,
            evaporation_factor: 0.5,
            precipitation_factor: 0.25,
            runoff_factor: 0.25,
            seepage_factor: 0.125,
            wind_direction: HexDirection::NorthWest,
            wind_strength: 4.0,
            river_percentage: 10,
            extra_lake_probability: 0.25,
            low_temperature: 0.0,
            high_temperature: 1.0,
            hemisphere: HemisphereMode::Both,
            temperature_jitter: 0.1,
        }
    }
}

/// Checks that span multiple fields, or that the range validator can't
/// express
fn validate_generator(
    config: &GeneratorConfig,
) -> Result<(), ValidationError> {
    if config.chunk_size_min >= config.chunk_size_max {
        return Err(ValidationError::new("chunk_size_min_exceeds_max"));
    }
    if config.elevation_minimum < -4 {
        return Err(ValidationError::new("elevation_minimum_too_low"));
    }
    Ok(())
}
