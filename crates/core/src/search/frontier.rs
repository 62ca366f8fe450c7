use crate::{grid::CellIndex, search::queue::CellPriorityQueue};

/// Generation tag stamped onto a cell by a search. Every search claims two
/// fresh values: cells tagged with the even one are on the frontier, cells
/// tagged with the odd one have been settled, and anything older hasn't been
/// reached by this search at all. This means the cells never need to be
/// wiped between searches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchPhase(u32);

/// Where a cell stands relative to the running search
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitState {
    Unvisited,
    Frontier,
    Settled,
}

impl SearchPhase {
    /// Classify a cell tag against the phase of the running search
    pub fn visit_state(self, current: SearchPhase) -> VisitState {
        if self < current {
            VisitState::Unvisited
        } else if self == current {
            VisitState::Frontier
        } else {
            VisitState::Settled
        }
    }

    /// The tag for a cell that has been taken off the frontier
    pub fn settled(self) -> SearchPhase {
        SearchPhase(self.0 + 1)
    }
}

/// Per-cell search bookkeeping, owned by the cell
#[derive(Copy, Clone, Debug, Default)]
pub struct SearchData {
    pub(crate) phase: SearchPhase,
    pub(crate) distance: i32,
    pub(crate) heuristic: i32,
    pub(crate) path_from: Option<CellIndex>,
}

impl SearchData {
    /// Priority in the frontier queue
    pub fn priority(&self) -> i32 {
        self.distance + self.heuristic
    }
}

/// The queue and phase counter shared by every search on one grid
#[derive(Debug, Default)]
pub(crate) struct SearchFrontier {
    pub queue: CellPriorityQueue,
    phase: SearchPhase,
}

impl SearchFrontier {
    /// Start a new search: claim a fresh phase and empty the queue
    pub fn begin(&mut self) -> SearchPhase {
        self.phase = SearchPhase(self.phase.0 + 2);
        self.queue.clear();
        self.phase
    }
}
