use super::SearchTree;
use crate::common::{Path, Position};
use crate::grid::{Grid, Occupancy};
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, instrument, trace};

/// Multi-goal breadth-first search. The first goal dequeued is the nearest
/// reachable one, so the returned path has the minimum step count.
#[instrument(skip_all, name = "bfs", fields(start = format!("{:?}", start), goals = goals.len()), level = "debug")]
pub fn bfs_search(
    grid: &Grid,
    start: Position,
    goals: &BTreeSet<Position>,
    occupancy: &Occupancy,
    stats: &mut Stats,
) -> Path {
    stats.searches += 1;

    let mut tree = SearchTree::new(start);
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([SearchTree::ROOT]);

    while let Some(current) = queue.pop_front() {
        stats.expanded_nodes += 1;
        let position = tree.position(current);
        trace!("expand node: {position:?}");

        if goals.contains(&position) {
            return tree.path_to(current);
        }

        for (step, neighbor) in grid.get_neighbors(position) {
            if visited.contains(&neighbor) {
                continue;
            }
            // Goals stay enterable even when nominally held.
            if occupancy.is_occupied(neighbor) && !goals.contains(&neighbor) {
                continue;
            }
            visited.insert(neighbor);
            let g_cost = tree.g_cost(current) + 1;
            queue.push_back(tree.push(current, neighbor, step, g_cost));
        }
    }

    debug!("no reachable goal");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::tests::{blockers, init_tracing};

    #[test]
    fn test_bfs_open_grid() {
        init_tracing();
        let grid = Grid::new(10);
        let goals = BTreeSet::from([(0, 3)]);
        let stats = &mut Stats::default();
        let path = bfs_search(&grid, (0, 0), &goals, &blockers(&[]), stats);
        assert_eq!(path, vec![(0, 1), (0, 1), (0, 1)]);
        assert_eq!(stats.searches, 1);
    }

    #[test]
    fn test_bfs_picks_nearest_goal() {
        init_tracing();
        let grid = Grid::new(10);
        let goals = BTreeSet::from([(9, 9), (4, 0)]);
        let path = bfs_search(&grid, (0, 0), &goals, &blockers(&[]), &mut Stats::default());
        assert_eq!(path.len(), 4);
        assert!(path.iter().all(|&step| step == (1, 0)));
    }

    // Wall along y = 1 from x = 0 to x = 2, goal straight above it.
    #[test]
    fn test_bfs_detour_around_wall() {
        init_tracing();
        let grid = Grid::new(4);
        let occupancy = blockers(&[(0, 1), (1, 1), (2, 1)]);
        let goals = BTreeSet::from([(0, 3)]);
        let path = bfs_search(&grid, (0, 0), &goals, &occupancy, &mut Stats::default());
        assert_eq!(path.len(), 9);
    }

    #[test]
    fn test_bfs_goal_enterable_when_occupied() {
        init_tracing();
        let grid = Grid::new(10);
        let occupancy = blockers(&[(0, 1)]);
        let goals = BTreeSet::from([(0, 1)]);
        let path = bfs_search(&grid, (0, 0), &goals, &occupancy, &mut Stats::default());
        assert_eq!(path, vec![(0, 1)]);
    }

    #[test]
    fn test_bfs_unreachable() {
        init_tracing();
        let grid = Grid::new(10);
        let occupancy = blockers(&[(0, 1), (1, 0)]);
        let goals = BTreeSet::from([(5, 5)]);
        let path = bfs_search(&grid, (0, 0), &goals, &occupancy, &mut Stats::default());
        assert!(path.is_empty());
    }

    #[test]
    fn test_bfs_start_on_goal() {
        let grid = Grid::new(10);
        let goals = BTreeSet::from([(3, 3)]);
        let path = bfs_search(&grid, (3, 3), &goals, &blockers(&[]), &mut Stats::default());
        assert!(path.is_empty());
    }
}
