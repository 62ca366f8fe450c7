use crate::{
    grid::{cell::HexCell, CellEffect, CellIndex, HexGrid},
    hex::{HexDirection, HexEdgeType},
};
use derive_more::Display;
use log::debug;
use serde::Serialize;

/// Handle to a unit placed on a [HexGrid](crate::HexGrid)
#[derive(
    Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[display(fmt = "unit#{}", _0)]
pub struct UnitId(pub usize);

/// Something that moves across the grid and sees around itself. The
/// pathfinder asks a mover where it may go and what each step costs. The
/// default methods describe a regular land unit.
pub trait Mover {
    /// Movement points available per turn
    fn speed(&self) -> i32;

    /// How many cells away this mover can see, on flat ground
    fn vision_range(&self) -> i32;

    /// Can this mover end a step in `cell`?
    fn is_valid_destination(&self, cell: &HexCell) -> bool {
        cell.is_explored() && !cell.is_underwater() && cell.unit().is_none()
    }

    /// Cost of stepping from `from` into its neighbor `to`, or `None` if the
    /// step is impossible. Roads make any step cheap. Otherwise cliffs block,
    /// walls block unless a road passes through, slopes cost double and
    /// development in the target slows movement down.
    fn move_cost(
        &self,
        from: &HexCell,
        to: &HexCell,
        direction: HexDirection,
    ) -> Option<i32> {
        if !self.is_valid_destination(to) {
            return None;
        }
        let edge_type = from.edge_type_with(to);
        if edge_type == HexEdgeType::Cliff {
            return None;
        }

        if from.has_road_through_edge(direction) {
            Some(1)
        } else if from.walled() != to.walled() {
            None
        } else {
            let base = if edge_type == HexEdgeType::Flat { 5 } else { 10 };
            Some(
                base + to.urban_level() as i32
                    + to.farm_level() as i32
                    + to.plant_level() as i32,
            )
        }
    }
}

/// A unit standing on the grid. Units occupy exactly one cell and block other
/// units from entering it.
#[derive(Clone, Debug, Serialize)]
pub struct HexUnit {
    pub(crate) location: CellIndex,
    /// Facing, in degrees
    pub(crate) orientation: f64,
}

impl HexUnit {
    pub const SPEED: i32 = 24;
    pub const VISION_RANGE: i32 = 3;

    pub fn location(&self) -> CellIndex {
        self.location
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }
}

impl Mover for HexUnit {
    fn speed(&self) -> i32 {
        Self::SPEED
    }

    fn vision_range(&self) -> i32 {
        Self::VISION_RANGE
    }
}

impl HexGrid {
    /// Place a new unit on a cell. The unit immediately starts seeing around
    /// itself. Returns `None`, without changing anything, if the cell is
    /// already occupied.
    pub fn add_unit(
        &mut self,
        location: CellIndex,
        orientation: f64,
    ) -> Option<(UnitId, Vec<CellEffect>)> {
        if self.cells[location.0].unit.is_some() {
            return None;
        }
        let unit = HexUnit {
            location,
            orientation,
        };
        let vision_range = unit.vision_range();
        // Reuse the slot of a removed unit if there is one
        let id = match self.units.iter().position(Option::is_none) {
            Some(slot) => {
                self.units[slot] = Some(unit);
                UnitId(slot)
            }
            None => {
                self.units.push(Some(unit));
                UnitId(self.units.len() - 1)
            }
        };
        self.cells[location.0].unit = Some(id);
        debug!("Added {} at {}", id, location);

        let effects = self.increase_visibility(location, vision_range);
        Some((id, effects))
    }

    /// Take a unit off the map, hiding whatever only it could see. Unknown
    /// units are ignored.
    pub fn remove_unit(&mut self, id: UnitId) -> Vec<CellEffect> {
        let unit = match self.units.get_mut(id.0).and_then(Option::take) {
            Some(unit) => unit,
            None => return Vec::new(),
        };
        self.cells[unit.location.0].unit = None;
        debug!("Removed {} from {}", id, unit.location);
        self.decrease_visibility(unit.location, unit.vision_range())
    }

    /// Move a unit to the end of a path, typically one produced by
    /// [HexGrid::get_path]. The unit's vision moves with it and it ends up
    /// facing along the final step. Ignored if the unit is unknown, the path
    /// is empty or the destination is occupied by another unit.
    pub fn travel_unit(
        &mut self,
        id: UnitId,
        path: &[CellIndex],
    ) -> Vec<CellEffect> {
        let destination = match path.last() {
            Some(&destination) => destination,
            None => return Vec::new(),
        };
        let (origin, vision_range) = match self.unit(id) {
            Some(unit) => (unit.location, unit.vision_range()),
            None => return Vec::new(),
        };
        if destination != origin && self.cells[destination.0].unit.is_some() {
            return Vec::new();
        }

        let mut effects = self.decrease_visibility(origin, vision_range);
        self.cells[origin.0].unit = None;
        self.cells[destination.0].unit = Some(id);

        let orientation = match path {
            [.., from, to] => {
                let from = self.cells[from.0].position;
                let to = self.cells[to.0].position;
                Some((to.x - from.x).atan2(to.z - from.z).to_degrees())
            }
            _ => None,
        };
        if let Some(Some(unit)) = self.units.get_mut(id.0) {
            unit.location = destination;
            if let Some(orientation) = orientation {
                unit.orientation = orientation;
            }
        }

        for effect in self.increase_visibility(destination, vision_range) {
            super::notify(&mut effects, effect);
        }
        super::notify(&mut effects, CellEffect::ValidateUnitLocation(id));
        effects
    }

    pub fn unit(&self, id: UnitId) -> Option<&HexUnit> {
        self.units.get(id.0).and_then(Option::as_ref)
    }

    /// All units currently on the map
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &HexUnit)> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter_map(|(i, unit)| unit.as_ref().map(|unit| (UnitId(i), unit)))
    }
}
