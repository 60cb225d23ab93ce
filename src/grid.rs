use std::collections::HashSet;

use crate::common::{AgentPosition, Position, Step, CARDINAL_STEPS};

/// Square board of side `size`. Bounds are fixed for the lifetime of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub size: usize,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Grid { size }
    }

    pub fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && x < self.size as isize && y < self.size as isize
    }

    /// Cell reached from `position` by `step`, if it stays on the board.
    pub fn offset(&self, position: Position, step: Step) -> Option<Position> {
        let x = position.0 as isize + step.0;
        let y = position.1 as isize + step.1;
        if self.contains(x, y) {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    pub fn get_neighbors(&self, position: Position) -> Vec<(Step, Position)> {
        CARDINAL_STEPS
            .iter()
            .filter_map(|&step| self.offset(position, step).map(|next| (step, next)))
            .collect()
    }

    pub fn corners(&self) -> [Position; 4] {
        let last = self.size.saturating_sub(1);
        [(0, 0), (last, 0), (0, last), (last, last)]
    }
}

/// Cells held by agents, frozen for the duration of one strategy call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    cells: HashSet<Position>,
}

impl Occupancy {
    pub fn snapshot(agents: &[AgentPosition], exclude: Option<usize>) -> Self {
        Occupancy {
            cells: agents
                .iter()
                .filter(|agent| Some(agent.id) != exclude)
                .map(|agent| agent.position)
                .collect(),
        }
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
