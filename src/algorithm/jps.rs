//! Jump Point Search over the 8-connected view of the grid.
//!
//! A diagonal move is only legal when both of its orthogonal corner cells
//! are passable, so every diagonal is two cardinal steps around a clear
//! corner. The g-cost of a jump is the number of cardinal steps it
//! decomposes into, and the pruning rules are the no-corner-cutting ones:
//! diagonal moves never have forced neighbors, straight moves have one where
//! a side cell opens up behind a blocker.

use super::{decompose, manhattan, OpenNode, SearchTree};
use crate::common::{is_diagonal, Path, Position, Step};
use crate::grid::{Grid, Occupancy};
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument, trace};

const ALL_DIRECTIONS: [Step; 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// One edge of a jump-point path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    pub direction: Step,
    pub from: Position,
    pub to: Position,
}

impl Jump {
    /// Number of unit moves along `direction`.
    pub fn length(&self) -> usize {
        self.from.0.abs_diff(self.to.0).max(self.from.1.abs_diff(self.to.1))
    }
}

struct Field<'a> {
    grid: &'a Grid,
    occupancy: &'a Occupancy,
    goal: Position,
}

impl Field<'_> {
    fn passable(&self, x: isize, y: isize) -> bool {
        if !self.grid.contains(x, y) {
            return false;
        }
        let position = (x as usize, y as usize);
        position == self.goal || !self.occupancy.is_occupied(position)
    }

    fn can_step(&self, x: isize, y: isize, (dx, dy): Step) -> bool {
        if !self.passable(x + dx, y + dy) {
            return false;
        }
        if dx != 0 && dy != 0 {
            return self.passable(x + dx, y) && self.passable(x, y + dy);
        }
        true
    }

    fn successors(&self, parent: Option<Position>, current: Position) -> Vec<Step> {
        let Some(parent) = parent else {
            return ALL_DIRECTIONS.to_vec();
        };

        let (x, y) = (current.0 as isize, current.1 as isize);
        let dx = (x - parent.0 as isize).signum();
        let dy = (y - parent.1 as isize).signum();
        let mut directions = Vec::with_capacity(5);

        if dx != 0 && dy != 0 {
            if self.passable(x + dx, y) {
                directions.push((dx, 0));
            }
            if self.passable(x, y + dy) {
                directions.push((0, dy));
            }
            if self.can_step(x, y, (dx, dy)) {
                directions.push((dx, dy));
            }
        } else if dx != 0 {
            if self.passable(x + dx, y) {
                directions.push((dx, 0));
            }
            for side in [1, -1] {
                if self.passable(x, y + side) && !self.passable(x - dx, y + side) {
                    directions.push((0, side));
                    if self.can_step(x, y, (dx, side)) {
                        directions.push((dx, side));
                    }
                }
            }
        } else {
            if self.passable(x, y + dy) {
                directions.push((0, dy));
            }
            for side in [1, -1] {
                if self.passable(x + side, y) && !self.passable(x + side, y - dy) {
                    directions.push((side, 0));
                    if self.can_step(x, y, (side, dy)) {
                        directions.push((side, dy));
                    }
                }
            }
        }
        directions
    }

    // Only straight moves have forced neighbors: a side cell that is open
    // here but was blocked one step back.
    fn has_forced_neighbor(&self, x: isize, y: isize, (dx, dy): Step) -> bool {
        if dx != 0 {
            (self.passable(x, y + 1) && !self.passable(x - dx, y + 1))
                || (self.passable(x, y - 1) && !self.passable(x - dx, y - 1))
        } else {
            (self.passable(x + 1, y) && !self.passable(x + 1, y - dy))
                || (self.passable(x - 1, y) && !self.passable(x - 1, y - dy))
        }
    }

    fn jump_straight(&self, mut x: isize, mut y: isize, direction: Step) -> Option<Position> {
        loop {
            if !self.can_step(x, y, direction) {
                return None;
            }
            x += direction.0;
            y += direction.1;
            let position = (x as usize, y as usize);
            if position == self.goal || self.has_forced_neighbor(x, y, direction) {
                return Some(position);
            }
        }
    }

    // The orthogonal checks are straight walks, so this never recurses.
    fn jump(&self, current: Position, direction: Step) -> Option<Position> {
        let (mut x, mut y) = (current.0 as isize, current.1 as isize);
        if !is_diagonal(direction) {
            return self.jump_straight(x, y, direction);
        }

        loop {
            if !self.can_step(x, y, direction) {
                return None;
            }
            x += direction.0;
            y += direction.1;
            let position = (x as usize, y as usize);
            if position == self.goal
                || self.jump_straight(x, y, (direction.0, 0)).is_some()
                || self.jump_straight(x, y, (0, direction.1)).is_some()
            {
                return Some(position);
            }
        }
    }
}

/// Candidate directions out of `current`. Without a parent all eight
/// directions are candidates; otherwise natural plus forced neighbors.
pub fn identify_successors(
    grid: &Grid,
    occupancy: &Occupancy,
    goal: Position,
    parent: Option<Position>,
    current: Position,
) -> Vec<Step> {
    let field = Field {
        grid,
        occupancy,
        goal,
    };
    field.successors(parent, current)
}

/// Walks from `current` along `direction` and returns the next jump point.
pub fn jump(
    grid: &Grid,
    occupancy: &Occupancy,
    goal: Position,
    current: Position,
    direction: Step,
) -> Option<Position> {
    let field = Field {
        grid,
        occupancy,
        goal,
    };
    field.jump(current, direction)
}

/// Jump-point path from `start` to `goal`, one entry per jump.
#[instrument(skip_all, name = "jps", fields(start = format!("{:?}", start), goal = format!("{:?}", goal)), level = "debug")]
pub fn jps_search(
    grid: &Grid,
    start: Position,
    goal: Position,
    occupancy: &Occupancy,
    stats: &mut Stats,
) -> Vec<Jump> {
    stats.searches += 1;

    let field = Field {
        grid,
        occupancy,
        goal,
    };
    let mut tree = SearchTree::new(start);
    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut sequence = 0;

    open_list.insert(OpenNode {
        f_cost: manhattan(start, goal) as f64,
        sequence,
        node: SearchTree::ROOT,
    });

    while let Some(current) = open_list.pop_first() {
        let position = tree.position(current.node);
        if position == goal {
            let directions = tree.path_to(current.node);
            let waypoints = tree.positions_to(current.node);
            return directions
                .into_iter()
                .zip(waypoints.windows(2))
                .map(|(direction, pair)| Jump {
                    direction,
                    from: pair[0],
                    to: pair[1],
                })
                .collect();
        }
        if !closed_list.insert(position) {
            continue;
        }

        stats.expanded_nodes += 1;
        trace!("expand jump point: {position:?} f {:?}", current.f_cost);

        let parent = tree.parent_position(current.node);
        for direction in field.successors(parent, position) {
            let Some(jump_point) = field.jump(position, direction) else {
                continue;
            };
            if closed_list.contains(&jump_point) {
                continue;
            }
            let g_cost = tree.g_cost(current.node) + manhattan(position, jump_point);
            sequence += 1;
            let node = tree.push(current.node, jump_point, direction, g_cost);
            open_list.insert(OpenNode {
                f_cost: (g_cost + manhattan(jump_point, goal)) as f64,
                sequence,
                node,
            });
        }
    }

    debug!("cannot find solution");
    Vec::new()
}

/// [`jps_search`] expanded into per-cell cardinal steps.
pub fn jps_path(
    grid: &Grid,
    start: Position,
    goal: Position,
    occupancy: &Occupancy,
    stats: &mut Stats,
) -> Path {
    let jumps = jps_search(grid, start, goal, occupancy, stats);
    let unit_steps: Vec<Step> = jumps
        .iter()
        .flat_map(|jump| std::iter::repeat(jump.direction).take(jump.length()))
        .collect();
    let field = Field {
        grid,
        occupancy,
        goal,
    };
    decompose(grid, start, &unit_steps, |(x, y)| {
        field.passable(x as isize, y as isize)
    })
}
