use crate::algorithm::{
    bfs_search, informed_search, jps_path, nearest_goal, rrt_path, Priority,
};
use crate::common::{AgentPosition, Path, Position, Step, CARDINAL_STEPS, STAY};
use crate::config::SearchConfig;
use crate::grid::{Grid, Occupancy};
use crate::stat::Stats;

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Random,
    Greedy,
    RuleBased,
    Bfs,
    AStar,
    Jps,
    Rrt,
    Hybrid,
    BestFirst,
    WeightedAStar,
    WallFollower,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Random => "Random",
            StrategyKind::Greedy => "Greedy",
            StrategyKind::RuleBased => "Rule-based",
            StrategyKind::Bfs => "BFS",
            StrategyKind::AStar => "A*",
            StrategyKind::Jps => "JPS",
            StrategyKind::Rrt => "RRT",
            StrategyKind::Hybrid => "Hybrid",
            StrategyKind::BestFirst => "Best-First Search",
            StrategyKind::WeightedAStar => "Weighted A*",
            StrategyKind::WallFollower => "Wall Follower",
        }
    }
}

/// Everything a strategy may read during one call. The goal set belongs to
/// the controller; strategies never modify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub grid: Grid,
    pub goals: BTreeSet<Position>,
    pub agents: Vec<AgentPosition>,
}

// Right-hand rule: preference order keyed by the previous move.
fn wall_follower_order(last_direction: Step) -> [Step; 4] {
    match last_direction {
        (1, 0) => [(0, -1), (1, 0), (0, 1), (-1, 0)],
        (0, -1) => [(-1, 0), (0, -1), (1, 0), (0, 1)],
        (-1, 0) => [(0, 1), (-1, 0), (0, -1), (1, 0)],
        _ => [(1, 0), (0, 1), (-1, 0), (0, -1)],
    }
}

pub const WALL_FOLLOWER_INITIAL_DIRECTION: Step = (0, 1);

/// Rule the hybrid dispatcher applies once no goal is adjacent.
pub fn hybrid_choice(snapshot: &Snapshot) -> StrategyKind {
    let size = snapshot.grid.size;
    if snapshot.goals.len() < size / 5 {
        StrategyKind::Rrt
    } else if snapshot.agents.len() < size / 4 {
        StrategyKind::Jps
    } else {
        StrategyKind::AStar
    }
}

fn first_step(path: &Path) -> Step {
    path.first().copied().unwrap_or(STAY)
}

/// Runs one strategy per call. Holds no search state between calls apart
/// from accumulated statistics.
#[derive(Debug, Clone)]
pub struct Navigator {
    search: SearchConfig,
    stats: Stats,
}

impl Navigator {
    pub fn new(search: SearchConfig) -> Self {
        Navigator {
            search,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn into_stats(self) -> Stats {
        self.stats
    }

    /// Unit displacement for agent `me`, or `(0, 0)` to stay put.
    ///
    /// `last_direction` is the agent's wall-follower memory; no other
    /// strategy reads or writes it.
    #[instrument(skip_all, name = "next_move", fields(agent = me.id, strategy = strategy.name()), level = "debug")]
    pub fn next_move<R: Rng + ?Sized>(
        &mut self,
        strategy: StrategyKind,
        snapshot: &Snapshot,
        me: AgentPosition,
        last_direction: &mut Option<Step>,
        rng: &mut R,
    ) -> Step {
        let start_time = Instant::now();
        let occupancy = Occupancy::snapshot(&snapshot.agents, Some(me.id));

        let step = match strategy {
            StrategyKind::Random => random_move(snapshot, me.position, &occupancy, rng),
            StrategyKind::Greedy => greedy_move(me.position, &snapshot.goals),
            StrategyKind::RuleBased => adjacent_goal(snapshot, me.position, &occupancy)
                .unwrap_or_else(|| greedy_move(me.position, &snapshot.goals)),
            StrategyKind::WallFollower => {
                wall_follower_move(snapshot, me.position, &occupancy, last_direction)
            }
            StrategyKind::Bfs => self.bfs_move(snapshot, me.position, &occupancy),
            StrategyKind::AStar => {
                self.informed_move(snapshot, me.position, &occupancy, Priority::AStar)
            }
            StrategyKind::WeightedAStar => self.informed_move(
                snapshot,
                me.position,
                &occupancy,
                Priority::Weighted(self.search.weight),
            ),
            StrategyKind::BestFirst => {
                self.informed_move(snapshot, me.position, &occupancy, Priority::BestFirst)
            }
            StrategyKind::Jps => self.jps_move(snapshot, me.position, &occupancy),
            StrategyKind::Rrt => self.rrt_move(snapshot, me.position, &occupancy, rng),
            StrategyKind::Hybrid => self.hybrid_move(snapshot, me.position, &occupancy, rng),
        };

        self.stats.time_us += start_time.elapsed().as_micros() as usize;
        debug!("step {step:?}");
        step
    }

    fn bfs_move(&mut self, snapshot: &Snapshot, position: Position, occupancy: &Occupancy) -> Step {
        if snapshot.goals.is_empty() {
            return STAY;
        }
        let path = bfs_search(
            &snapshot.grid,
            position,
            &snapshot.goals,
            occupancy,
            &mut self.stats,
        );
        first_step(&path)
    }

    fn informed_move(
        &mut self,
        snapshot: &Snapshot,
        position: Position,
        occupancy: &Occupancy,
        priority: Priority,
    ) -> Step {
        let Some(goal) = nearest_goal(position, &snapshot.goals) else {
            return STAY;
        };
        let path = informed_search(
            &snapshot.grid,
            position,
            goal,
            occupancy,
            priority,
            &mut self.stats,
        );
        first_step(&path)
    }

    fn jps_move(&mut self, snapshot: &Snapshot, position: Position, occupancy: &Occupancy) -> Step {
        let Some(goal) = nearest_goal(position, &snapshot.goals) else {
            return STAY;
        };
        let path = jps_path(&snapshot.grid, position, goal, occupancy, &mut self.stats);
        first_step(&path)
    }

    fn rrt_move<R: Rng + ?Sized>(
        &mut self,
        snapshot: &Snapshot,
        position: Position,
        occupancy: &Occupancy,
        rng: &mut R,
    ) -> Step {
        let Some(goal) = nearest_goal(position, &snapshot.goals) else {
            return STAY;
        };
        let path = rrt_path(
            &snapshot.grid,
            position,
            goal,
            occupancy,
            &self.search,
            rng,
            &mut self.stats,
        );
        first_step(&path)
    }

    fn hybrid_move<R: Rng + ?Sized>(
        &mut self,
        snapshot: &Snapshot,
        position: Position,
        occupancy: &Occupancy,
        rng: &mut R,
    ) -> Step {
        if snapshot.goals.is_empty() {
            return STAY;
        }
        if let Some(step) = adjacent_goal(snapshot, position, occupancy) {
            return step;
        }

        let choice = hybrid_choice(snapshot);
        debug!("hybrid dispatch to {}", choice.name());
        match choice {
            StrategyKind::Rrt => self.rrt_move(snapshot, position, occupancy, rng),
            StrategyKind::Jps => self.jps_move(snapshot, position, occupancy),
            _ => self.informed_move(snapshot, position, occupancy, Priority::AStar),
        }
    }
}

fn random_move<R: Rng + ?Sized>(
    snapshot: &Snapshot,
    position: Position,
    occupancy: &Occupancy,
    rng: &mut R,
) -> Step {
    let mut directions = CARDINAL_STEPS;
    directions.shuffle(rng);
    directions
        .into_iter()
        .find(|&step| {
            snapshot
                .grid
                .offset(position, step)
                .is_some_and(|next| !occupancy.is_occupied(next))
        })
        .unwrap_or(STAY)
}

// Resolves x before y. Never looks at occupancy, so it can stall.
fn greedy_move(position: Position, goals: &BTreeSet<Position>) -> Step {
    let Some(target) = nearest_goal(position, goals) else {
        return STAY;
    };
    if position.0 < target.0 {
        (1, 0)
    } else if position.0 > target.0 {
        (-1, 0)
    } else if position.1 < target.1 {
        (0, 1)
    } else if position.1 > target.1 {
        (0, -1)
    } else {
        STAY
    }
}

fn adjacent_goal(snapshot: &Snapshot, position: Position, occupancy: &Occupancy) -> Option<Step> {
    snapshot
        .grid
        .get_neighbors(position)
        .into_iter()
        .find(|(_, next)| {
            snapshot.goals.contains(next) && !occupancy.is_occupied(*next)
        })
        .map(|(step, _)| step)
}

fn wall_follower_move(
    snapshot: &Snapshot,
    position: Position,
    occupancy: &Occupancy,
    last_direction: &mut Option<Step>,
) -> Step {
    let heading = last_direction.unwrap_or(WALL_FOLLOWER_INITIAL_DIRECTION);
    for step in wall_follower_order(heading) {
        let open = snapshot
            .grid
            .offset(position, step)
            .is_some_and(|next| !occupancy.is_occupied(next));
        if open {
            *last_direction = Some(step);
            return step;
        }
    }
    STAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::tests::init_tracing;
    use crate::algorithm::{jps_path, Priority};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ALL_STRATEGIES: [StrategyKind; 11] = [
        StrategyKind::Random,
        StrategyKind::Greedy,
        StrategyKind::RuleBased,
        StrategyKind::Bfs,
        StrategyKind::AStar,
        StrategyKind::Jps,
        StrategyKind::Rrt,
        StrategyKind::Hybrid,
        StrategyKind::BestFirst,
        StrategyKind::WeightedAStar,
        StrategyKind::WallFollower,
    ];

    // Agent 0 is the querying agent; the rest are blockers.
    fn snapshot(size: usize, me: Position, others: &[Position], goals: &[Position]) -> Snapshot {
        let mut agents = vec![AgentPosition {
            id: 0,
            position: me,
        }];
        agents.extend(
            others
                .iter()
                .enumerate()
                .map(|(index, &position)| AgentPosition {
                    id: index + 1,
                    position,
                }),
        );
        Snapshot {
            grid: Grid::new(size),
            goals: goals.iter().copied().collect(),
            agents,
        }
    }

    fn me(snapshot: &Snapshot) -> AgentPosition {
        snapshot.agents[0]
    }

    // One cold-start call for agent 0, returning its step and search stats.
    fn decide(
        strategy: StrategyKind,
        snapshot: &Snapshot,
        memory: &mut Option<Step>,
        rng: &mut StdRng,
    ) -> (Step, Stats) {
        let mut navigator = Navigator::new(SearchConfig::default());
        let step = navigator.next_move(strategy, snapshot, me(snapshot), memory, rng);
        (step, navigator.into_stats())
    }

    #[test]
    fn test_open_grid_searches_agree() {
        init_tracing();
        let snapshot = snapshot(10, (0, 0), &[], &[(0, 3)]);
        let mut rng = StdRng::seed_from_u64(0);
        for strategy in [
            StrategyKind::Bfs,
            StrategyKind::AStar,
            StrategyKind::WeightedAStar,
            StrategyKind::Jps,
        ] {
            let (step, stats) = decide(strategy, &snapshot, &mut None, &mut rng);
            assert_eq!(step, (0, 1), "{}", strategy.name());
            assert_eq!(stats.searches, 1);
        }

        let occupancy = Occupancy::snapshot(&snapshot.agents, Some(0));
        let stats = &mut Stats::default();
        let grid = snapshot.grid;
        let bfs = bfs_search(&grid, (0, 0), &snapshot.goals, &occupancy, stats);
        assert_eq!(bfs.len(), 3);
        for priority in [Priority::AStar, Priority::Weighted(2.0)] {
            let path = informed_search(&grid, (0, 0), (0, 3), &occupancy, priority, stats);
            assert_eq!(path.len(), 3);
        }
        assert_eq!(jps_path(&grid, (0, 0), (0, 3), &occupancy, stats).len(), 3);
    }

    #[test]
    fn test_boxed_in_agent_stays() {
        init_tracing();
        let others = [(5, 6), (5, 4), (4, 5), (6, 5)];
        let snapshot = snapshot(10, (5, 5), &others, &[(9, 9), (0, 0)]);
        let mut rng = StdRng::seed_from_u64(3);
        for strategy in ALL_STRATEGIES {
            let mut memory = Some((0, 1));
            let (step, _) = decide(strategy, &snapshot, &mut memory, &mut rng);
            match strategy {
                // Greedy never checks occupancy; the controller rejects the move.
                StrategyKind::Greedy | StrategyKind::RuleBased => assert_ne!(step, STAY),
                _ => assert_eq!(step, STAY, "{}", strategy.name()),
            }
            assert_eq!(memory, Some((0, 1)));
        }
    }

    #[test]
    fn test_adjacent_goal_skips_search() {
        init_tracing();
        let others = [(9, 9), (9, 0), (0, 9)];
        let snapshot = snapshot(10, (0, 0), &others, &[(1, 0), (5, 5), (7, 7)]);
        let mut rng = StdRng::seed_from_u64(0);
        for strategy in [StrategyKind::RuleBased, StrategyKind::Hybrid] {
            let (step, stats) = decide(strategy, &snapshot, &mut None, &mut rng);
            assert_eq!(step, (1, 0));
            assert_eq!(stats.searches, 0);
            assert_eq!(stats.rrt_iterations, 0);
        }
    }

    #[test]
    fn test_rule_based_ignores_occupied_goal() {
        let snapshot = snapshot(10, (2, 2), &[(2, 3)], &[(2, 3), (0, 2)]);
        let mut rng = StdRng::seed_from_u64(0);
        // Held goal is skipped; greedy then heads for the nearest goal (2, 3)
        // along y since x already matches.
        let (step, _) = decide(StrategyKind::RuleBased, &snapshot, &mut None, &mut rng);
        assert_eq!(step, (0, 1));
    }

    #[test]
    fn test_greedy_resolves_x_first() {
        assert_eq!(greedy_move((2, 2), &BTreeSet::from([(5, 0)])), (1, 0));
        assert_eq!(greedy_move((7, 2), &BTreeSet::from([(5, 9)])), (-1, 0));
        assert_eq!(greedy_move((5, 2), &BTreeSet::from([(5, 9)])), (0, 1));
        assert_eq!(greedy_move((5, 9), &BTreeSet::from([(5, 2)])), (0, -1));
        assert_eq!(greedy_move((5, 9), &BTreeSet::new()), STAY);
    }

    #[test]
    fn test_wall_follower_turns_right() {
        init_tracing();
        // At the corner with the cell above held: only the right is open.
        let snapshot = snapshot(10, (0, 0), &[(0, 1)], &[(5, 5)]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut memory = Some((0, 1));
        let (step, _) = decide(StrategyKind::WallFollower, &snapshot, &mut memory, &mut rng);
        assert_eq!(step, (1, 0));
        assert_eq!(memory, Some((1, 0)));
    }

    #[test]
    fn test_wall_follower_default_direction() {
        let snapshot = snapshot(10, (4, 4), &[(5, 4)], &[]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut memory = None;
        // Heading up by default: right is blocked, so continue up.
        let (step, _) = decide(StrategyKind::WallFollower, &snapshot, &mut memory, &mut rng);
        assert_eq!(step, (0, 1));
        assert_eq!(memory, Some((0, 1)));
    }

    #[test]
    fn test_wall_follower_order_table() {
        assert_eq!(wall_follower_order((0, 1))[0], (1, 0));
        assert_eq!(wall_follower_order((1, 0))[0], (0, -1));
        assert_eq!(wall_follower_order((0, -1))[0], (-1, 0));
        assert_eq!(wall_follower_order((-1, 0))[0], (0, 1));
    }

    #[test]
    fn test_random_move_is_valid_and_seeded() {
        let snapshot = snapshot(10, (0, 0), &[(1, 0)], &[]);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            decide(StrategyKind::Random, &snapshot, &mut None, &mut rng).0
        };
        for seed in 0..20 {
            // Only up is in-bounds and free.
            assert_eq!(run(seed), (0, 1));
        }
    }

    #[test]
    fn test_hybrid_choice() {
        // One goal on a 10x10 grid: 1 < 10 / 5.
        let sparse = snapshot(10, (0, 0), &[], &[(6, 6)]);
        assert_eq!(hybrid_choice(&sparse), StrategyKind::Rrt);

        // Plenty of goals, alone on the grid: 1 < 10 / 4.
        let lonely = snapshot(10, (0, 0), &[], &[(6, 6), (3, 8), (8, 3)]);
        assert_eq!(hybrid_choice(&lonely), StrategyKind::Jps);

        let crowded = snapshot(10, (0, 0), &[(9, 9), (9, 0)], &[(6, 6), (3, 8), (8, 3)]);
        assert_eq!(hybrid_choice(&crowded), StrategyKind::AStar);
    }

    #[test]
    fn test_hybrid_uses_rrt_for_sparse_goals() {
        init_tracing();
        let snapshot = snapshot(10, (0, 0), &[], &[(6, 6)]);
        let mut rng = StdRng::seed_from_u64(9);
        let (step, stats) = decide(StrategyKind::Hybrid, &snapshot, &mut None, &mut rng);
        assert!(step == (1, 0) || step == (0, 1));
        assert!(stats.rrt_iterations > 0);
    }

    #[test]
    fn test_no_goals_means_stay() {
        let snapshot = snapshot(10, (4, 4), &[], &[]);
        let mut rng = StdRng::seed_from_u64(0);
        for strategy in ALL_STRATEGIES {
            if matches!(strategy, StrategyKind::Random | StrategyKind::WallFollower) {
                continue;
            }
            let (step, _) = decide(strategy, &snapshot, &mut None, &mut rng);
            assert_eq!(step, STAY, "{}", strategy.name());
        }
    }

    #[test]
    fn test_steps_are_always_cardinal() {
        init_tracing();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..200 {
            let me_position = (rng.gen_range(0..10), rng.gen_range(0..10));
            let others: Vec<Position> = (0..3)
                .map(|_| (rng.gen_range(0..10), rng.gen_range(0..10)))
                .filter(|&position| position != me_position)
                .collect();
            let goals: Vec<Position> = (0..4)
                .map(|_| (rng.gen_range(0..10), rng.gen_range(0..10)))
                .collect();
            let snapshot = snapshot(10, me_position, &others, &goals);
            for strategy in ALL_STRATEGIES {
                let (step, _) = decide(strategy, &snapshot, &mut None, &mut rng);
                assert!(
                    step == STAY || CARDINAL_STEPS.contains(&step),
                    "{} returned {step:?}",
                    strategy.name()
                );
            }
        }
    }
}
