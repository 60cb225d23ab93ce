use crate::common::{Agent, Position, Step, STAY};
use crate::config::Config;
use crate::grid::Grid;
use crate::stat::Stats;
use crate::strategy::{Navigator, Snapshot, StrategyKind};

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub id: usize,
    pub strategy: StrategyKind,
    pub position: Position,
    pub collected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub turns: usize,
    pub goals_remaining: usize,
    pub agents: Vec<AgentSummary>,
    pub stats: Stats,
}

/// `count` distinct goal cells, never on a corner.
pub fn generate_goals<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> BTreeSet<Position> {
    let corners = grid.corners();
    let capacity = grid.size.saturating_mul(grid.size).saturating_sub(corners.len());
    let count = count.min(capacity);

    let mut goals = BTreeSet::new();
    while goals.len() < count {
        let candidate = (rng.gen_range(0..grid.size), rng.gen_range(0..grid.size));
        if !corners.contains(&candidate) {
            goals.insert(candidate);
        }
    }
    goals
}

/// Headless controller for one round.
///
/// Each turn every agent is asked for a step in ascending id order and the
/// step is applied only if the destination is on the grid and not held by
/// another agent. In sequential mode every agent sees the moves already
/// applied earlier in the same turn. In concurrent mode all agents plan
/// against one snapshot taken at the start of the turn, and the planned
/// steps are then applied in the same id order.
pub struct Simulation {
    config: Config,
    grid: Grid,
    agents: Vec<Agent>,
    goals: BTreeSet<Position>,
    turn: usize,
    rng: StdRng,
    stats: Stats,
}

impl Simulation {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let grid = Grid::new(config.grid_size);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let agents = config
            .strategies
            .iter()
            .zip(grid.corners())
            .enumerate()
            .map(|(id, (&strategy, corner))| Agent::new(id, corner, strategy))
            .collect();
        let goals = generate_goals(&grid, config.goal_count, &mut rng);
        info!("Generate goals: {goals:?}");

        Ok(Simulation::from_parts(config, agents, goals, rng))
    }

    pub fn from_parts(
        config: &Config,
        agents: Vec<Agent>,
        goals: BTreeSet<Position>,
        rng: StdRng,
    ) -> Self {
        Simulation {
            config: config.clone(),
            grid: Grid::new(config.grid_size),
            agents,
            goals,
            turn: 0,
            rng,
            stats: Stats::default(),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn goals(&self) -> &BTreeSet<Position> {
        &self.goals
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.goals.is_empty() || self.turn >= self.config.max_turns
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid,
            goals: self.goals.clone(),
            agents: self.agents.iter().map(Agent::as_position).collect(),
        }
    }

    /// Moves agent `index` by `step` if the destination is in-bounds and
    /// free, collecting a goal found there. Returns whether it moved.
    fn apply(&mut self, index: usize, step: Step) -> bool {
        if step == STAY {
            return false;
        }
        let Some(destination) = self.grid.offset(self.agents[index].position, step) else {
            debug!("agent {index} step {step:?} leaves the grid");
            return false;
        };
        if self.agents.iter().any(|agent| agent.position == destination) {
            debug!("agent {index} step {step:?} blocked at {destination:?}");
            return false;
        }

        let agent = &mut self.agents[index];
        agent.position = destination;
        if self.goals.remove(&destination) {
            agent.collected += 1;
            debug!("agent {index} collects {destination:?}");
        }
        true
    }

    /// One sequential turn: fresh snapshot per agent, in id order.
    #[instrument(skip_all, name = "turn", fields(turn = self.turn), level = "debug")]
    pub fn run_turn(&mut self) {
        for index in 0..self.agents.len() {
            let snapshot = self.snapshot();
            let agent = &self.agents[index];
            let (strategy, me) = (agent.strategy, agent.as_position());
            let mut last_direction = agent.last_direction;

            let mut navigator = Navigator::new(self.config.search);
            let rng = &mut self.rng;
            let step = navigator.next_move(strategy, &snapshot, me, &mut last_direction, rng);
            self.stats.merge(navigator.stats());

            // Wall-follower memory only advances on a move that lands.
            if self.apply(index, step) {
                self.agents[index].last_direction = last_direction;
            }
        }
        self.turn += 1;
    }

    /// One concurrent turn: every search runs on a blocking task against the
    /// same shared snapshot.
    #[instrument(skip_all, name = "concurrent_turn", fields(turn = self.turn), level = "debug")]
    pub async fn run_turn_concurrent(&mut self) -> anyhow::Result<()> {
        let snapshot = Arc::new(self.snapshot());
        let mut tasks = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            let snapshot = Arc::clone(&snapshot);
            let search = self.config.search;
            let (strategy, me) = (agent.strategy, agent.as_position());
            let mut last_direction = agent.last_direction;
            // Seeds are drawn in id order so a run is reproducible.
            let seed: u64 = self.rng.gen();

            tasks.push(tokio::task::spawn_blocking(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut navigator = Navigator::new(search);
                let memory = &mut last_direction;
                let step = navigator.next_move(strategy, &snapshot, me, memory, &mut rng);
                (step, last_direction, navigator.into_stats())
            }));
        }

        for (index, task) in tasks.into_iter().enumerate() {
            let (step, last_direction, stats) = task
                .await
                .with_context(|| format!("search task for agent {index} failed"))?;
            self.stats.merge(&stats);
            if self.apply(index, step) {
                self.agents[index].last_direction = last_direction;
            }
        }
        self.turn += 1;
        Ok(())
    }

    pub fn run(&mut self) -> RoundSummary {
        let start_time = Instant::now();
        while !self.is_finished() {
            self.run_turn();
        }
        self.finish(start_time)
    }

    pub async fn run_concurrent(&mut self) -> anyhow::Result<RoundSummary> {
        let start_time = Instant::now();
        while !self.is_finished() {
            self.run_turn_concurrent().await?;
        }
        Ok(self.finish(start_time))
    }

    fn finish(&mut self, start_time: Instant) -> RoundSummary {
        info!(
            "Round over after {} turns, {} goals left, {:?} microseconds",
            self.turn,
            self.goals.len(),
            start_time.elapsed().as_micros()
        );
        self.stats.print();
        self.summary()
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            turns: self.turn,
            goals_remaining: self.goals.len(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentSummary {
                    id: agent.id,
                    strategy: agent.strategy,
                    position: agent.position,
                    collected: agent.collected,
                })
                .collect(),
            stats: self.stats.clone(),
        }
    }
}
