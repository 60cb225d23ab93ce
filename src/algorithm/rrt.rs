use super::{decompose, manhattan, SearchTree};
use crate::common::{Path, Position, Step};
use crate::config::SearchConfig;
use crate::grid::{Grid, Occupancy};
use crate::stat::Stats;

use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, instrument, trace};

/// Goal-biased rapidly-exploring random tree grown one cell at a time.
///
/// Each iteration samples `goal` with probability `rrt_goal_bias`, otherwise a
/// uniform cell, and extends the tree node nearest to the sample by one step
/// signed independently per axis. Extensions may be diagonal; a diagonal one
/// is only accepted when one of its corner cells is free. Returns the raw
/// step sequence from `start` to `goal`, or an empty path once
/// `rrt_max_iterations` is exhausted.
#[instrument(skip_all, name = "rrt", fields(start = format!("{:?}", start), goal = format!("{:?}", goal)), level = "debug")]
pub fn rrt_search<R: Rng + ?Sized>(
    grid: &Grid,
    start: Position,
    goal: Position,
    occupancy: &Occupancy,
    config: &SearchConfig,
    rng: &mut R,
    stats: &mut Stats,
) -> Path {
    stats.searches += 1;
    if start == goal || grid.size == 0 {
        return Vec::new();
    }

    let free = |position: Position| !occupancy.is_occupied(position);
    let mut tree = SearchTree::new(start);
    let mut members = HashSet::from([start]);

    for iteration in 0..config.rrt_max_iterations {
        stats.rrt_iterations += 1;

        let sample = if rng.gen::<f64>() < config.rrt_goal_bias {
            goal
        } else {
            (rng.gen_range(0..grid.size), rng.gen_range(0..grid.size))
        };

        // First minimum in insertion order keeps seeded runs reproducible.
        let nearest = (0..tree.len()).min_by_key(|&node| manhattan(tree.position(node), sample));
        let Some(nearest) = nearest else {
            break;
        };
        let from = tree.position(nearest);
        let step: Step = (
            (sample.0 as isize - from.0 as isize).signum(),
            (sample.1 as isize - from.1 as isize).signum(),
        );
        if step == (0, 0) {
            continue;
        }

        let Some(next) = grid.offset(from, step) else {
            continue;
        };
        if !free(next) || members.contains(&next) {
            continue;
        }
        if step.0 != 0 && step.1 != 0 {
            let corner_free = [(step.0, 0), (0, step.1)]
                .into_iter()
                .filter_map(|corner| grid.offset(from, corner))
                .any(free);
            if !corner_free {
                continue;
            }
        }

        stats.expanded_nodes += 1;
        members.insert(next);
        let g_cost = tree.g_cost(nearest) + 1;
        let node = tree.push(nearest, next, step, g_cost);
        trace!("extend {from:?} -> {next:?}");

        if next == goal {
            debug!("goal reached after {} iterations", iteration + 1);
            return tree.path_to(node);
        }
    }

    debug!("iteration cap {} exhausted", config.rrt_max_iterations);
    Vec::new()
}

/// [`rrt_search`] with diagonal steps split into cardinal ones.
pub fn rrt_path<R: Rng + ?Sized>(
    grid: &Grid,
    start: Position,
    goal: Position,
    occupancy: &Occupancy,
    config: &SearchConfig,
    rng: &mut R,
    stats: &mut Stats,
) -> Path {
    let steps = rrt_search(grid, start, goal, occupancy, config, rng, stats);
    let free = |position: Position| !occupancy.is_occupied(position);
    decompose(grid, start, &steps, free)
}
