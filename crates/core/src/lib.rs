//! Hexmap is a hex cell grid for strategy game worlds. This crate contains
//! the cell graph, pathfinding and visibility searches, and a procedural map
//! generator. Rendering and input are left to other layers, which react to
//! the [CellEffect]s returned by every edit.
//!
//! ```
//! use hexmap::{HexMap, MapConfig};
//!
//! let map = HexMap::generate(MapConfig::default()).unwrap();
//! println!("{} cells", map.grid().cells().len());
//! // From here you can edit the map, place units and find paths.
//! ```
//!
//! See [MapConfig] for details on how map generation can be customized.

mod config;
mod generate;
mod grid;
mod hex;
mod map;
mod noise;
mod search;
mod util;

pub use crate::{
    config::{GeneratorConfig, HemisphereMode, MapConfig, Seed},
    generate::{ClimateCell, GenerationReport, MapGenerator, MapRegion},
    grid::{
        CellEffect, CellIndex, HexCell, HexGrid, HexUnit, Mover,
        TerrainType, UnitId,
    },
    hex::{metrics, HexCoordinates, HexDirection, HexEdgeType},
    map::HexMap,
    noise::{HexHash, NoiseContext, NOISE_CHANNELS},
    search::{
        CellPriorityQueue, PathQuery, PathStep, SearchData, SearchPhase,
        VisitState,
    },
};
