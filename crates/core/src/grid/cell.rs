use crate::{
    grid::{unit::UnitId, CellIndex},
    hex::{HexCoordinates, HexDirection, HexEdgeType},
    search::SearchData,
};
use nalgebra::Point3;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// The kind of ground a cell is covered with. The discriminant is the terrain
/// id used by renderers and save files.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Hash,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TerrainType {
    Sand = 0,
    Grass = 1,
    Mud = 2,
    Stone = 3,
    Snow = 4,
}

impl TerrainType {
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl Default for TerrainType {
    fn default() -> Self {
        Self::Sand
    }
}

/// One hex tile in the grid. Cells are owned by [HexGrid](crate::HexGrid),
/// and all mutation goes through the grid so that invariants spanning two
/// cells (rivers, roads, neighbors) can be enforced. This type only exposes
/// reads.
#[derive(Clone, Debug, Serialize)]
pub struct HexCell {
    pub(crate) index: CellIndex,
    pub(crate) coordinates: HexCoordinates,
    /// Index of the column of chunks this cell belongs to
    pub(crate) column_index: i32,
    pub(crate) chunk_index: usize,
    #[serde(skip)]
    pub(crate) position: Point3<f64>,

    pub(crate) elevation: i32,
    pub(crate) water_level: i32,
    pub(crate) terrain_type: TerrainType,
    pub(crate) urban_level: u8,
    pub(crate) farm_level: u8,
    pub(crate) plant_level: u8,
    pub(crate) special_index: u8,
    pub(crate) walled: bool,
    pub(crate) roads: [bool; 6],
    pub(crate) incoming_river: Option<HexDirection>,
    pub(crate) outgoing_river: Option<HexDirection>,

    pub(crate) explored: bool,
    pub(crate) explorable: bool,
    pub(crate) visibility: u32,
    pub(crate) unit: Option<UnitId>,

    #[serde(skip)]
    pub(crate) neighbors: [Option<CellIndex>; 6],
    #[serde(skip)]
    pub(crate) search: SearchData,
}

impl HexCell {
    pub(crate) fn new(
        index: CellIndex,
        coordinates: HexCoordinates,
        column_index: i32,
        chunk_index: usize,
        position: Point3<f64>,
    ) -> Self {
        Self {
            index,
            coordinates,
            column_index,
            chunk_index,
            position,
            elevation: 0,
            water_level: 0,
            terrain_type: TerrainType::default(),
            urban_level: 0,
            farm_level: 0,
            plant_level: 0,
            special_index: 0,
            walled: false,
            roads: [false; 6],
            incoming_river: None,
            outgoing_river: None,
            explored: false,
            explorable: false,
            visibility: 0,
            unit: None,
            neighbors: [None; 6],
            search: SearchData::default(),
        }
    }

    pub fn index(&self) -> CellIndex {
        self.index
    }

    pub fn coordinates(&self) -> HexCoordinates {
        self.coordinates
    }

    pub fn column_index(&self) -> i32 {
        self.column_index
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// World position of the cell's anchor, including the elevation offset
    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    pub fn neighbor(&self, direction: HexDirection) -> Option<CellIndex> {
        self.neighbors[direction.index()]
    }

    /// All existing neighbors, with the direction they lie in
    pub fn neighbors(
        &self,
    ) -> impl Iterator<Item = (HexDirection, CellIndex)> + '_ {
        HexDirection::ALL.iter().filter_map(move |&direction| {
            self.neighbor(direction).map(|neighbor| (direction, neighbor))
        })
    }

    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    pub fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    /// The height that sight lines and climate work from: the water surface
    /// for submerged cells, otherwise the ground.
    pub fn view_elevation(&self) -> i32 {
        self.elevation.max(self.water_level)
    }

    pub fn edge_type_with(&self, other: &HexCell) -> HexEdgeType {
        HexEdgeType::between(self.elevation, other.elevation)
    }

    pub fn elevation_difference(&self, other: &HexCell) -> i32 {
        (self.elevation - other.elevation).abs()
    }

    pub fn terrain_type(&self) -> TerrainType {
        self.terrain_type
    }

    pub fn urban_level(&self) -> u8 {
        self.urban_level
    }

    pub fn farm_level(&self) -> u8 {
        self.farm_level
    }

    pub fn plant_level(&self) -> u8 {
        self.plant_level
    }

    pub fn special_index(&self) -> u8 {
        self.special_index
    }

    pub fn is_special(&self) -> bool {
        self.special_index > 0
    }

    pub fn walled(&self) -> bool {
        self.walled
    }

    pub fn incoming_river(&self) -> Option<HexDirection> {
        self.incoming_river
    }

    pub fn outgoing_river(&self) -> Option<HexDirection> {
        self.outgoing_river
    }

    pub fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    /// Does a river start or end here (as opposed to flowing through)?
    pub fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction)
            || self.outgoing_river == Some(direction)
    }

    pub fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads[direction.index()]
    }

    pub fn has_roads(&self) -> bool {
        self.roads.iter().any(|&road| road)
    }

    /// Can a river flow from this cell into `neighbor`? Rivers only run
    /// downhill or level, except that a lake may spill into a cell at its
    /// surface height.
    pub fn is_valid_river_destination(&self, neighbor: &HexCell) -> bool {
        self.elevation >= neighbor.elevation
            || self.water_level == neighbor.elevation
    }

    /// Visible right now to at least one viewer
    pub fn is_visible(&self) -> bool {
        self.visibility > 0 && self.explorable
    }

    /// Has ever been visible
    pub fn is_explored(&self) -> bool {
        self.explored && self.explorable
    }

    pub fn is_explorable(&self) -> bool {
        self.explorable
    }

    /// Number of viewers that can currently see this cell
    pub fn visibility(&self) -> u32 {
        self.visibility
    }

    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }
}
