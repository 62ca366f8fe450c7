//! Cell mutators. Each public method applies one edit and returns the effects
//! listeners need to hear about. Edits that would break an invariant are
//! ignored and return an empty list.

use crate::{
    grid::{notify, CellEffect, CellIndex, HexCell, HexGrid, TerrainType},
    hex::HexDirection,
};

impl HexGrid {
    pub fn set_elevation(
        &mut self,
        cell: CellIndex,
        elevation: i32,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        self.set_elevation_inner(cell, elevation, &mut effects);
        effects
    }

    fn set_elevation_inner(
        &mut self,
        cell: CellIndex,
        elevation: i32,
        effects: &mut Vec<CellEffect>,
    ) {
        let target = &mut self.cells[cell.0];
        if target.elevation == elevation {
            return;
        }
        let original_view_elevation = target.view_elevation();
        target.elevation = elevation;
        if target.view_elevation() != original_view_elevation {
            notify(effects, CellEffect::ViewElevationChanged(cell));
        }

        self.refresh_position(cell);
        notify(effects, CellEffect::Repositioned(cell));
        self.validate_rivers(cell, effects);

        for direction in HexDirection::ALL {
            if let Some(neighbor) = self.neighbor(cell, direction) {
                if self.cells[cell.0].has_road_through_edge(direction)
                    && self.cells[cell.0]
                        .elevation_difference(&self.cells[neighbor.0])
                        > 1
                {
                    self.set_road(cell, direction, false, effects);
                }
            }
        }

        self.refresh(cell, effects);
    }

    pub fn set_water_level(
        &mut self,
        cell: CellIndex,
        water_level: i32,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        let target = &mut self.cells[cell.0];
        if target.water_level == water_level {
            return effects;
        }
        let original_view_elevation = target.view_elevation();
        target.water_level = water_level;
        if target.view_elevation() != original_view_elevation {
            notify(&mut effects, CellEffect::ViewElevationChanged(cell));
        }
        self.validate_rivers(cell, &mut effects);
        self.refresh(cell, &mut effects);
        effects
    }

    pub fn set_terrain_type(
        &mut self,
        cell: CellIndex,
        terrain_type: TerrainType,
    ) -> Vec<CellEffect> {
        let target = &mut self.cells[cell.0];
        if target.terrain_type == terrain_type {
            return Vec::new();
        }
        target.terrain_type = terrain_type;
        vec![CellEffect::TerrainChanged(cell)]
    }

    pub fn set_urban_level(
        &mut self,
        cell: CellIndex,
        level: u8,
    ) -> Vec<CellEffect> {
        self.set_feature_level(cell, level, |cell| &mut cell.urban_level)
    }

    pub fn set_farm_level(
        &mut self,
        cell: CellIndex,
        level: u8,
    ) -> Vec<CellEffect> {
        self.set_feature_level(cell, level, |cell| &mut cell.farm_level)
    }

    pub fn set_plant_level(
        &mut self,
        cell: CellIndex,
        level: u8,
    ) -> Vec<CellEffect> {
        self.set_feature_level(cell, level, |cell| &mut cell.plant_level)
    }

    fn set_feature_level(
        &mut self,
        cell: CellIndex,
        level: u8,
        field: impl FnOnce(&mut HexCell) -> &mut u8,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        let current = field(&mut self.cells[cell.0]);
        if *current != level {
            *current = level;
            self.refresh_self_only(cell, &mut effects);
        }
        effects
    }

    /// Place a special feature (castle, ziggurat...) on a cell. Ignored while
    /// a river flows through the cell. Special cells can't have roads, so any
    /// existing roads are removed.
    pub fn set_special_index(
        &mut self,
        cell: CellIndex,
        special_index: u8,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        let target = &self.cells[cell.0];
        if target.special_index != special_index && !target.has_river() {
            self.cells[cell.0].special_index = special_index;
            self.remove_roads_inner(cell, &mut effects);
            self.refresh_self_only(cell, &mut effects);
        }
        effects
    }

    pub fn set_walled(
        &mut self,
        cell: CellIndex,
        walled: bool,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        if self.cells[cell.0].walled != walled {
            self.cells[cell.0].walled = walled;
            self.refresh(cell, &mut effects);
        }
        effects
    }

    /// Mark a cell as explored (or not) without going through visibility.
    /// Used when restoring a saved map.
    pub fn set_explored(
        &mut self,
        cell: CellIndex,
        explored: bool,
    ) -> Vec<CellEffect> {
        let target = &mut self.cells[cell.0];
        if target.explored == explored {
            return Vec::new();
        }
        target.explored = explored;
        vec![CellEffect::VisibilityChanged(cell)]
    }

    pub fn set_explorable(
        &mut self,
        cell: CellIndex,
        explorable: bool,
    ) -> Vec<CellEffect> {
        let target = &mut self.cells[cell.0];
        if target.explorable == explorable {
            return Vec::new();
        }
        target.explorable = explorable;
        vec![CellEffect::VisibilityChanged(cell)]
    }

    /// Start a river flowing out of `cell` toward `direction`. Does nothing
    /// if there's no neighbor there, the neighbor is uphill, or the river is
    /// already in place. Any river this one conflicts with, at either end, is
    /// removed first.
    pub fn set_outgoing_river(
        &mut self,
        cell: CellIndex,
        direction: HexDirection,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        if self.cells[cell.0].outgoing_river == Some(direction) {
            return effects;
        }
        let neighbor = match self.neighbor(cell, direction) {
            Some(neighbor) => neighbor,
            None => return effects,
        };
        if !self.cells[cell.0]
            .is_valid_river_destination(&self.cells[neighbor.0])
        {
            return effects;
        }

        self.remove_outgoing_river_inner(cell, &mut effects);
        if self.cells[cell.0].incoming_river == Some(direction) {
            self.remove_incoming_river_inner(cell, &mut effects);
        }
        let source = &mut self.cells[cell.0];
        source.outgoing_river = Some(direction);
        source.special_index = 0;

        self.remove_incoming_river_inner(neighbor, &mut effects);
        let target = &mut self.cells[neighbor.0];
        target.incoming_river = Some(direction.opposite());
        target.special_index = 0;

        self.set_road(cell, direction, false, &mut effects);
        // Refresh both ends even if there was no road to clear
        self.refresh_self_only(cell, &mut effects);
        self.refresh_self_only(neighbor, &mut effects);
        effects
    }

    pub fn remove_outgoing_river(&mut self, cell: CellIndex) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        self.remove_outgoing_river_inner(cell, &mut effects);
        effects
    }

    pub fn remove_incoming_river(&mut self, cell: CellIndex) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        self.remove_incoming_river_inner(cell, &mut effects);
        effects
    }

    /// Remove both the incoming and outgoing river of a cell
    pub fn remove_river(&mut self, cell: CellIndex) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        self.remove_outgoing_river_inner(cell, &mut effects);
        self.remove_incoming_river_inner(cell, &mut effects);
        effects
    }

    fn remove_outgoing_river_inner(
        &mut self,
        cell: CellIndex,
        effects: &mut Vec<CellEffect>,
    ) {
        let direction = match self.cells[cell.0].outgoing_river.take() {
            Some(direction) => direction,
            None => return,
        };
        self.refresh_self_only(cell, effects);
        if let Some(neighbor) = self.neighbor(cell, direction) {
            self.cells[neighbor.0].incoming_river = None;
            self.refresh_self_only(neighbor, effects);
        }
    }

    fn remove_incoming_river_inner(
        &mut self,
        cell: CellIndex,
        effects: &mut Vec<CellEffect>,
    ) {
        let direction = match self.cells[cell.0].incoming_river.take() {
            Some(direction) => direction,
            None => return,
        };
        self.refresh_self_only(cell, effects);
        if let Some(neighbor) = self.neighbor(cell, direction) {
            self.cells[neighbor.0].outgoing_river = None;
            self.refresh_self_only(neighbor, effects);
        }
    }

    /// Drop any river touching `cell` that no longer flows downhill, e.g.
    /// after an elevation change.
    fn validate_rivers(
        &mut self,
        cell: CellIndex,
        effects: &mut Vec<CellEffect>,
    ) {
        let this = &self.cells[cell.0];
        if let Some(direction) = this.outgoing_river {
            let invalid = self.neighbor(cell, direction).map_or(true, |n| {
                !this.is_valid_river_destination(&self.cells[n.0])
            });
            if invalid {
                self.remove_outgoing_river_inner(cell, effects);
            }
        }

        let this = &self.cells[cell.0];
        if let Some(direction) = this.incoming_river {
            let invalid = self.neighbor(cell, direction).map_or(true, |n| {
                !self.cells[n.0].is_valid_river_destination(this)
            });
            if invalid {
                self.remove_incoming_river_inner(cell, effects);
            }
        }
    }

    /// Add a road from `cell` toward `direction`. Ignored if the road exists,
    /// a river crosses that edge, either cell is special, or the elevation
    /// difference is too steep.
    pub fn add_road(
        &mut self,
        cell: CellIndex,
        direction: HexDirection,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        let this = &self.cells[cell.0];
        let neighbor = match self.neighbor(cell, direction) {
            Some(neighbor) => neighbor,
            None => return effects,
        };
        let other = &self.cells[neighbor.0];
        if !this.has_road_through_edge(direction)
            && !this.has_river_through_edge(direction)
            && !this.is_special()
            && !other.is_special()
            && this.elevation_difference(other) <= 1
        {
            self.set_road(cell, direction, true, &mut effects);
        }
        effects
    }

    pub fn remove_roads(&mut self, cell: CellIndex) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        self.remove_roads_inner(cell, &mut effects);
        effects
    }

    fn remove_roads_inner(
        &mut self,
        cell: CellIndex,
        effects: &mut Vec<CellEffect>,
    ) {
        for direction in HexDirection::ALL {
            if self.cells[cell.0].has_road_through_edge(direction) {
                self.set_road(cell, direction, false, effects);
            }
        }
    }

    /// Set the road flag on both sides of an edge
    fn set_road(
        &mut self,
        cell: CellIndex,
        direction: HexDirection,
        state: bool,
        effects: &mut Vec<CellEffect>,
    ) {
        let neighbor = match self.neighbor(cell, direction) {
            Some(neighbor) => neighbor,
            None => return,
        };
        self.cells[cell.0].roads[direction.index()] = state;
        self.cells[neighbor.0].roads[direction.opposite().index()] = state;
        self.refresh_self_only(neighbor, effects);
        self.refresh_self_only(cell, effects);
    }

    /// Rebuild this cell's chunk plus any neighboring chunks, since cell edges
    /// are drawn by both sides.
    fn refresh(&self, cell: CellIndex, effects: &mut Vec<CellEffect>) {
        let this = &self.cells[cell.0];
        notify(effects, CellEffect::RefreshChunk(this.chunk_index));
        for (_, neighbor) in this.neighbors() {
            notify(
                effects,
                CellEffect::RefreshChunk(self.cells[neighbor.0].chunk_index),
            );
        }
        if let Some(unit) = this.unit {
            notify(effects, CellEffect::ValidateUnitLocation(unit));
        }
    }

    fn refresh_self_only(&self, cell: CellIndex, effects: &mut Vec<CellEffect>) {
        let this = &self.cells[cell.0];
        notify(effects, CellEffect::RefreshChunk(this.chunk_index));
        if let Some(unit) = this.unit {
            notify(effects, CellEffect::ValidateUnitLocation(unit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::flat_grid;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    /// Check that rivers are consistent across the whole grid
    fn assert_rivers_consistent(grid: &HexGrid) {
        for cell in grid.cells() {
            if let Some(direction) = cell.outgoing_river() {
                let neighbor = grid.neighbor(cell.index(), direction).unwrap();
                assert_eq!(
                    grid.cell(neighbor).incoming_river(),
                    Some(direction.opposite()),
                    "outgoing river of {} has no matching incoming river",
                    cell.index()
                );
            }
            if let Some(direction) = cell.incoming_river() {
                let neighbor = grid.neighbor(cell.index(), direction).unwrap();
                assert_eq!(
                    grid.cell(neighbor).outgoing_river(),
                    Some(direction.opposite()),
                    "incoming river of {} has no matching outgoing river",
                    cell.index()
                );
            }
        }
    }

    #[test]
    fn test_set_elevation() {
        let mut grid = flat_grid(10, 10, false);
        let cell = grid.cell_at_offset(4, 4).unwrap();
        assert!(grid.set_elevation(cell, 0).is_empty());

        let effects = grid.set_elevation(cell, 3);
        assert_eq!(grid.cell(cell).elevation(), 3);
        assert!(effects.contains(&CellEffect::ViewElevationChanged(cell)));
        assert!(effects.contains(&CellEffect::Repositioned(cell)));
        assert!(effects.contains(&CellEffect::RefreshChunk(0)));
        // Position follows elevation
        let y = grid.cell(cell).position().y;
        assert!((y - 9.0).abs() <= 1.5, "unexpected height {}", y);
    }

    #[test]
    fn test_view_elevation_unchanged_under_water() {
        let mut grid = flat_grid(10, 10, false);
        let cell = grid.cell_at_offset(4, 4).unwrap();
        grid.set_water_level(cell, 5);
        let effects = grid.set_elevation(cell, 2);
        assert!(!effects.contains(&CellEffect::ViewElevationChanged(cell)));
        assert_eq!(grid.cell(cell).view_elevation(), 5);
    }

    #[test]
    fn test_river() {
        let mut grid = flat_grid(10, 10, false);
        let source = grid.cell_at_offset(4, 4).unwrap();
        let target = grid.neighbor(source, HexDirection::East).unwrap();
        grid.set_elevation(source, 2);
        grid.set_elevation(target, 1);

        // Uphill is rejected
        assert!(grid.set_outgoing_river(target, HexDirection::West).is_empty());
        assert!(!grid.cell(target).has_river());

        assert!(!grid.set_outgoing_river(source, HexDirection::East).is_empty());
        assert_eq!(grid.cell(source).outgoing_river(), Some(HexDirection::East));
        assert_eq!(grid.cell(target).incoming_river(), Some(HexDirection::West));
        assert!(grid.cell(target).has_river_begin_or_end());

        // Setting the same river again is a no-op
        assert!(grid.set_outgoing_river(source, HexDirection::East).is_empty());

        // Raising the target above the source breaks the river
        grid.set_elevation(target, 4);
        assert!(!grid.cell(source).has_river());
        assert!(!grid.cell(target).has_river());
    }

    #[test]
    fn test_river_clears_special_and_road() {
        let mut grid = flat_grid(10, 10, false);
        let source = grid.cell_at_offset(4, 4).unwrap();
        let target = grid.neighbor(source, HexDirection::SouthWest).unwrap();
        grid.add_road(source, HexDirection::SouthWest);
        assert!(grid.cell(target).has_road_through_edge(HexDirection::NorthEast));
        grid.set_special_index(target, 2);
        // Special cells lose their roads
        assert!(!grid.cell(source).has_roads());

        grid.set_outgoing_river(source, HexDirection::SouthWest);
        assert_eq!(grid.cell(target).special_index(), 0);

        // No special features on river cells
        grid.set_special_index(target, 1);
        assert!(!grid.cell(target).is_special());
    }

    #[test]
    fn test_river_replaces_conflicts() {
        let mut grid = flat_grid(10, 10, false);
        let a = grid.cell_at_offset(4, 4).unwrap();
        let b = grid.neighbor(a, HexDirection::East).unwrap();
        let c = grid.neighbor(a, HexDirection::NorthEast).unwrap();
        grid.set_outgoing_river(a, HexDirection::East);
        // Redirecting a's river frees b
        grid.set_outgoing_river(a, HexDirection::NorthEast);
        assert!(!grid.cell(b).has_river());
        assert_eq!(grid.cell(c).incoming_river(), Some(HexDirection::SouthWest));

        // Flowing back into a cell reverses the river
        grid.set_outgoing_river(c, HexDirection::SouthWest);
        assert_eq!(grid.cell(a).outgoing_river(), None);
        assert_eq!(grid.cell(a).incoming_river(), Some(HexDirection::NorthEast));
        assert_rivers_consistent(&grid);
    }

    #[test]
    fn test_random_river_edits_stay_consistent() {
        let mut grid = flat_grid(10, 10, false);
        let mut rng = Pcg64::seed_from_u64(42);
        let cell_count = grid.cells().len();
        for i in 0..cell_count {
            grid.set_elevation(CellIndex(i), rng.gen_range(0..4));
        }

        for _ in 0..2000 {
            let cell = CellIndex(rng.gen_range(0..cell_count));
            let direction = HexDirection::from_index(rng.gen_range(0..6));
            match rng.gen_range(0..5) {
                0 => {
                    grid.remove_river(cell);
                }
                1 => {
                    grid.set_elevation(cell, rng.gen_range(0..4));
                }
                _ => {
                    grid.set_outgoing_river(cell, direction);
                }
            }
            assert_rivers_consistent(&grid);
        }
    }

    #[test]
    fn test_roads() {
        let mut grid = flat_grid(10, 10, false);
        let cell = grid.cell_at_offset(4, 4).unwrap();
        let east = grid.neighbor(cell, HexDirection::East).unwrap();
        let west = grid.neighbor(cell, HexDirection::West).unwrap();

        grid.add_road(cell, HexDirection::East);
        assert!(grid.cell(cell).has_road_through_edge(HexDirection::East));
        assert!(grid.cell(east).has_road_through_edge(HexDirection::West));

        // Too steep
        grid.set_elevation(west, 2);
        assert!(grid.add_road(cell, HexDirection::West).is_empty());

        // Roads are dropped when the slope gets too steep
        grid.set_elevation(east, 2);
        assert!(!grid.cell(cell).has_roads());
        assert!(!grid.cell(east).has_roads());

        // No roads across rivers
        grid.set_elevation(west, 0);
        grid.set_outgoing_river(cell, HexDirection::West);
        assert!(grid.add_road(cell, HexDirection::West).is_empty());

        grid.add_road(cell, HexDirection::NorthEast);
        grid.add_road(cell, HexDirection::SouthEast);
        grid.remove_roads(cell);
        assert!(!grid.cell(cell).has_roads());
    }

    #[test]
    fn test_feature_levels() {
        let mut grid = flat_grid(10, 10, false);
        let cell = CellIndex(12);
        assert!(!grid.set_urban_level(cell, 2).is_empty());
        assert!(grid.set_urban_level(cell, 2).is_empty());
        grid.set_farm_level(cell, 1);
        grid.set_plant_level(cell, 3);
        assert_eq!(grid.cell(cell).urban_level(), 2);
        assert_eq!(grid.cell(cell).farm_level(), 1);
        assert_eq!(grid.cell(cell).plant_level(), 3);

        assert_eq!(
            grid.set_terrain_type(cell, TerrainType::Snow),
            vec![CellEffect::TerrainChanged(cell)]
        );
        assert_eq!(grid.cell(cell).terrain_type(), TerrainType::Snow);

        grid.set_walled(cell, true);
        assert!(grid.cell(cell).walled());
    }
}
