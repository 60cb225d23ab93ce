use super::{manhattan, OpenNode, SearchTree};
use crate::common::{Path, Position};
use crate::grid::{Grid, Occupancy};
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument, trace};

/// How a node's priority combines path cost `g` and heuristic `h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Priority {
    /// `g + h`, optimal with the Manhattan heuristic.
    AStar,
    /// `g + w * h`, trades optimality for fewer expansions.
    Weighted(f64),
    /// `h` only.
    BestFirst,
}

impl Priority {
    pub fn f_cost(&self, g_cost: usize, h_cost: usize) -> f64 {
        match *self {
            Priority::AStar => (g_cost + h_cost) as f64,
            Priority::Weighted(weight) => g_cost as f64 + weight * h_cost as f64,
            Priority::BestFirst => h_cost as f64,
        }
    }
}

/// Priority-queue search from `start` to a single `goal`.
#[instrument(skip_all, name = "informed", fields(start = format!("{:?}", start), goal = format!("{:?}", goal), priority = ?priority), level = "debug")]
pub fn informed_search(
    grid: &Grid,
    start: Position,
    goal: Position,
    occupancy: &Occupancy,
    priority: Priority,
    stats: &mut Stats,
) -> Path {
    stats.searches += 1;

    let mut tree = SearchTree::new(start);
    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut sequence = 0;

    open_list.insert(OpenNode {
        f_cost: priority.f_cost(0, manhattan(start, goal)),
        sequence,
        node: SearchTree::ROOT,
    });

    while let Some(current) = open_list.pop_first() {
        let position = tree.position(current.node);
        if position == goal {
            return tree.path_to(current.node);
        }
        if !closed_list.insert(position) {
            continue;
        }

        stats.expanded_nodes += 1;
        trace!("expand node: {position:?} f {:?}", current.f_cost);

        let tentative_g_cost = tree.g_cost(current.node) + 1;
        for (step, neighbor) in grid.get_neighbors(position) {
            if closed_list.contains(&neighbor) {
                continue;
            }
            if occupancy.is_occupied(neighbor) && neighbor != goal {
                continue;
            }
            sequence += 1;
            let node = tree.push(current.node, neighbor, step, tentative_g_cost);
            open_list.insert(OpenNode {
                f_cost: priority.f_cost(tentative_g_cost, manhattan(neighbor, goal)),
                sequence,
                node,
            });
        }
    }

    debug!("cannot find solution");
    Vec::new()
}
