mod bfs;
mod informed;
mod jps;
mod rrt;

pub use bfs::bfs_search;
pub use informed::{informed_search, Priority};
pub use jps::{identify_successors, jps_path, jps_search, jump, Jump};
pub use rrt::{rrt_path, rrt_search};

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::common::{is_diagonal, Path, Position, Step};
use crate::grid::Grid;

/// Manhattan distance; admissible and consistent for 4-connected unit moves.
pub fn manhattan(a: Position, b: Position) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

/// Goal closest to `position`. Ties go to the smallest `(x, y)`.
pub fn nearest_goal(position: Position, goals: &BTreeSet<Position>) -> Option<Position> {
    goals
        .iter()
        .copied()
        .min_by_key(|goal| manhattan(position, *goal))
}

/// Split every diagonal step into two cardinal ones. The x-axis move goes
/// first when its intermediate cell is passable, otherwise the y-axis move.
pub fn decompose(
    grid: &Grid,
    start: Position,
    steps: &[Step],
    passable: impl Fn(Position) -> bool,
) -> Path {
    let mut path = Vec::with_capacity(steps.len() * 2);
    let mut current = start;
    for &step in steps {
        if is_diagonal(step) {
            let x_first = grid
                .offset(current, (step.0, 0))
                .is_some_and(|corner| passable(corner));
            if x_first {
                path.push((step.0, 0));
                path.push((0, step.1));
            } else {
                path.push((0, step.1));
                path.push((step.0, 0));
            }
        } else {
            path.push(step);
        }
        match grid.offset(current, step) {
            Some(next) => current = next,
            None => break,
        }
    }
    path
}

#[derive(Debug, Clone)]
struct TreeNode {
    position: Position,
    parent: Option<usize>,
    step: Step,
    g_cost: usize,
}

/// Arena of search nodes; each node points back at the node it was reached from.
#[derive(Debug, Clone)]
pub(crate) struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    pub(crate) fn new(root: Position) -> Self {
        SearchTree {
            nodes: vec![TreeNode {
                position: root,
                parent: None,
                step: (0, 0),
                g_cost: 0,
            }],
        }
    }

    pub(crate) const ROOT: usize = 0;

    pub(crate) fn push(
        &mut self,
        parent: usize,
        position: Position,
        step: Step,
        g_cost: usize,
    ) -> usize {
        self.nodes.push(TreeNode {
            position,
            parent: Some(parent),
            step,
            g_cost,
        });
        self.nodes.len() - 1
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn position(&self, node: usize) -> Position {
        self.nodes[node].position
    }

    pub(crate) fn parent_position(&self, node: usize) -> Option<Position> {
        self.nodes[node].parent.map(|parent| self.nodes[parent].position)
    }

    pub(crate) fn g_cost(&self, node: usize) -> usize {
        self.nodes[node].g_cost
    }

    /// Steps from the root to `node`, root first.
    pub(crate) fn path_to(&self, mut node: usize) -> Path {
        let mut path = Vec::new();
        while let Some(parent) = self.nodes[node].parent {
            path.push(self.nodes[node].step);
            node = parent;
        }
        path.reverse();
        path
    }

    /// Positions from the root to `node`, both ends included.
    pub(crate) fn positions_to(&self, mut node: usize) -> Vec<Position> {
        let mut positions = vec![self.nodes[node].position];
        while let Some(parent) = self.nodes[node].parent {
            positions.push(self.nodes[parent].position);
            node = parent;
        }
        positions.reverse();
        positions
    }
}

/// Open-list entry. Lower `f_cost` first, then earlier insertion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenNode {
    pub(crate) f_cost: f64,
    pub(crate) sequence: usize,
    pub(crate) node: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .total_cmp(&other.f_cost)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}
