//! Searches over the cell graph. Pathfinding and the visibility flood share
//! one bucket queue and one phase counter per grid, so neither allocates or
//! wipes cell state between calls once the grid is warmed up.

mod frontier;
mod queue;

pub use frontier::{SearchData, SearchPhase, VisitState};
pub(crate) use frontier::SearchFrontier;
pub use queue::CellPriorityQueue;

use crate::{
    grid::{CellEffect, CellIndex, HexGrid, Mover},
    hex::HexDirection,
};
use log::trace;
use serde::Serialize;

/// One cell along a found path
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub cell: CellIndex,
    /// Movement cost spent to get here, including points forfeited at turn
    /// boundaries
    pub distance: i32,
    /// The turn in which the mover arrives here. The starting cell is turn 0.
    pub turn: i32,
}

/// The last path query run on a grid, and its answer
#[derive(Clone, Debug, Serialize)]
pub struct PathQuery {
    from: CellIndex,
    to: CellIndex,
    speed: i32,
    /// `None` if the destination couldn't be reached
    steps: Option<Vec<PathStep>>,
}

impl PathQuery {
    pub fn from(&self) -> CellIndex {
        self.from
    }

    pub fn to(&self) -> CellIndex {
        self.to
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn steps(&self) -> Option<&[PathStep]> {
        self.steps.as_deref()
    }
}

/// Which turn a mover is in after spending `distance` movement points
fn turn_of(distance: i32, speed: i32) -> i32 {
    (distance - 1) / speed
}

impl HexGrid {
    /// Find the cheapest route for `mover` from one cell to another. The
    /// result replaces the grid's current path and can be read back with
    /// [HexGrid::get_path] or [HexGrid::get_path_steps]. Returns whether the
    /// destination is reachable.
    ///
    /// Movement is paid per turn: if a step would spill over into the next
    /// turn, whatever is left of the current turn is forfeited and the step
    /// is paid entirely from the next one.
    pub fn find_path<M: Mover + ?Sized>(
        &mut self,
        from: CellIndex,
        to: CellIndex,
        mover: &M,
    ) -> bool {
        self.clear_path();
        let speed = mover.speed().max(1);
        let steps = if self.search(from, to, mover, speed) {
            Some(self.trace_path(from, to, speed))
        } else {
            None
        };
        trace!(
            "Path {} -> {}: {}",
            from,
            to,
            match &steps {
                Some(steps) => format!("{} steps", steps.len() - 1),
                None => "unreachable".into(),
            }
        );

        let found = steps.is_some();
        self.current_path = Some(PathQuery {
            from,
            to,
            speed,
            steps,
        });
        found
    }

    /// A* from `from` to `to`. On success, the back pointers on the cells
    /// lead from `to` back to `from`.
    fn search<M: Mover + ?Sized>(
        &mut self,
        from: CellIndex,
        to: CellIndex,
        mover: &M,
        speed: i32,
    ) -> bool {
        let phase = self.frontier.begin();
        let wrap_size = self.wrap_size();
        let target = self.cells[to.0].coordinates;

        self.cells[from.0].search = SearchData {
            phase,
            distance: 0,
            heuristic: 0,
            path_from: None,
        };
        self.frontier.queue.enqueue(from, 0);

        while let Some(current) = self.frontier.queue.dequeue() {
            let search = &mut self.cells[current.0].search;
            search.phase = search.phase.settled();
            if current == to {
                return true;
            }
            let current_distance = search.distance;
            let current_turn = turn_of(current_distance, speed);

            for &direction in &HexDirection::ALL {
                let neighbor = match self.cells[current.0].neighbor(direction)
                {
                    Some(neighbor) => neighbor,
                    None => continue,
                };
                let neighbor_cell = &self.cells[neighbor.0];
                let state = neighbor_cell.search.phase.visit_state(phase);
                if state == VisitState::Settled {
                    continue;
                }
                let move_cost = match mover.move_cost(
                    &self.cells[current.0],
                    neighbor_cell,
                    direction,
                ) {
                    Some(cost) => cost,
                    None => continue,
                };

                let mut distance = current_distance + move_cost;
                let turn = turn_of(distance, speed);
                if turn > current_turn {
                    distance = turn * speed + move_cost;
                }

                match state {
                    VisitState::Unvisited => {
                        let heuristic = neighbor_cell
                            .coordinates
                            .distance_to(target, wrap_size);
                        let data = SearchData {
                            phase,
                            distance,
                            heuristic,
                            path_from: Some(current),
                        };
                        self.cells[neighbor.0].search = data;
                        self.frontier.queue.enqueue(neighbor, data.priority());
                    }
                    VisitState::Frontier
                        if distance < neighbor_cell.search.distance =>
                    {
                        let data = &mut self.cells[neighbor.0].search;
                        let old_priority = data.priority();
                        data.distance = distance;
                        data.path_from = Some(current);
                        let new_priority = data.priority();
                        self.frontier.queue.change(
                            neighbor,
                            old_priority,
                            new_priority,
                        );
                    }
                    _ => {}
                }
            }
        }
        false
    }

    /// Follow the back pointers left by a successful search
    fn trace_path(
        &self,
        from: CellIndex,
        to: CellIndex,
        speed: i32,
    ) -> Vec<PathStep> {
        let mut steps = Vec::new();
        let mut current = to;
        while current != from {
            let search = &self.cells[current.0].search;
            steps.push(PathStep {
                cell: current,
                distance: search.distance,
                turn: turn_of(search.distance, speed),
            });
            current = match search.path_from {
                Some(previous) => previous,
                None => break,
            };
        }
        steps.push(PathStep {
            cell: from,
            distance: 0,
            turn: 0,
        });
        steps.reverse();
        steps
    }

    /// Cells along the current path, source first. A path from a cell to
    /// itself holds just that cell. `None` if there is no path.
    pub fn get_path(&self) -> Option<Vec<CellIndex>> {
        self.get_path_steps()
            .map(|steps| steps.iter().map(|step| step.cell).collect())
    }

    /// Like [HexGrid::get_path], but with the cost and turn of each step
    pub fn get_path_steps(&self) -> Option<&[PathStep]> {
        self.current_path.as_ref().and_then(PathQuery::steps)
    }

    pub fn has_path(&self) -> bool {
        self.get_path_steps().is_some()
    }

    /// The last path query, whether it succeeded or not
    pub fn current_path(&self) -> Option<&PathQuery> {
        self.current_path.as_ref()
    }

    pub fn clear_path(&mut self) {
        self.current_path = None;
    }

    /// Flood outward from a cell to find everything a viewer there can see.
    /// Height helps: the viewer's own view elevation extends the range,
    /// while tall cells eat into it. A cell is never seen by a route longer
    /// than the straight hex distance, so sight doesn't bend around
    /// obstacles. Unexplorable cells block the flood, except for the
    /// viewer's own cell which is always included.
    pub fn get_visible_cells(
        &mut self,
        from: CellIndex,
        range: i32,
    ) -> Vec<CellIndex> {
        let phase = self.frontier.begin();
        let wrap_size = self.wrap_size();
        let range = range + self.cells[from.0].view_elevation();
        let origin = self.cells[from.0].coordinates;
        let mut visible = Vec::new();

        self.cells[from.0].search = SearchData {
            phase,
            distance: 0,
            heuristic: 0,
            path_from: None,
        };
        self.frontier.queue.enqueue(from, 0);

        while let Some(current) = self.frontier.queue.dequeue() {
            let search = &mut self.cells[current.0].search;
            search.phase = search.phase.settled();
            let distance = search.distance + 1;
            visible.push(current);

            for &direction in &HexDirection::ALL {
                let neighbor = match self.cells[current.0].neighbor(direction)
                {
                    Some(neighbor) => neighbor,
                    None => continue,
                };
                let neighbor_cell = &self.cells[neighbor.0];
                let state = neighbor_cell.search.phase.visit_state(phase);
                if state == VisitState::Settled || !neighbor_cell.explorable {
                    continue;
                }
                if distance + neighbor_cell.view_elevation() > range
                    || distance
                        > origin.distance_to(neighbor_cell.coordinates, wrap_size)
                {
                    continue;
                }

                match state {
                    VisitState::Unvisited => {
                        self.cells[neighbor.0].search = SearchData {
                            phase,
                            distance,
                            heuristic: 0,
                            path_from: None,
                        };
                        self.frontier.queue.enqueue(neighbor, distance);
                    }
                    VisitState::Frontier
                        if distance < neighbor_cell.search.distance =>
                    {
                        let old_priority = neighbor_cell.search.priority();
                        self.cells[neighbor.0].search.distance = distance;
                        self.frontier.queue.change(
                            neighbor,
                            old_priority,
                            distance,
                        );
                    }
                    _ => {}
                }
            }
        }

        trace!(
            "{} cells visible from {} (range {})",
            visible.len(),
            from,
            range
        );
        visible
    }

    /// Add one viewer at `from`. Cells that go from hidden to visible are
    /// marked explored for good.
    pub fn increase_visibility(
        &mut self,
        from: CellIndex,
        range: i32,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        for index in self.get_visible_cells(from, range) {
            let cell = &mut self.cells[index.0];
            cell.visibility += 1;
            if cell.visibility == 1 {
                cell.explored = true;
                effects.push(CellEffect::VisibilityChanged(index));
            }
        }
        effects
    }

    /// Remove one viewer at `from`. Must mirror an earlier
    /// [HexGrid::increase_visibility] with the same arguments and the same
    /// terrain in between, otherwise the counts drift.
    pub fn decrease_visibility(
        &mut self,
        from: CellIndex,
        range: i32,
    ) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        for index in self.get_visible_cells(from, range) {
            let cell = &mut self.cells[index.0];
            if cell.visibility > 0 {
                cell.visibility -= 1;
                if cell.visibility == 0 {
                    effects.push(CellEffect::VisibilityChanged(index));
                }
            }
        }
        effects
    }

    /// Hide everything, then let every unit look around again. Used after
    /// terrain changes that may have altered sight lines.
    pub fn reset_visibility(&mut self) -> Vec<CellEffect> {
        let mut effects = Vec::new();
        for cell in &mut self.cells {
            if cell.visibility > 0 {
                cell.visibility = 0;
                effects.push(CellEffect::VisibilityChanged(cell.index));
            }
        }

        let viewers: Vec<(CellIndex, i32)> = self
            .units()
            .map(|(_, unit)| (unit.location(), unit.vision_range()))
            .collect();
        for (location, range) in viewers {
            for effect in self.increase_visibility(location, range) {
                crate::grid::notify(&mut effects, effect);
            }
        }
        effects
    }
}
