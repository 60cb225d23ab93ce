use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;

use crate::strategy::StrategyKind;

#[derive(Parser, Debug, Default)]
#[command(
    name = "grid-nav",
    about = "Agents racing for goals on a shared grid, each driven by its own navigation strategy.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Side length of the square grid")]
    pub grid_size: Option<usize>,

    #[arg(long, help = "Number of goals scattered at the start of the round")]
    pub goal_count: Option<usize>,

    #[arg(long, help = "Turn limit for the round")]
    pub max_turns: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(
        long,
        help = "Strategy per agent, in corner order",
        value_enum,
        value_delimiter = ','
    )]
    pub strategies: Vec<StrategyKind>,

    #[arg(long, help = "Heuristic weight for weighted A*")]
    pub weight: Option<f64>,

    #[arg(long, help = "Iteration cap for RRT")]
    pub rrt_max_iterations: Option<usize>,

    #[arg(long, help = "Probability that RRT samples the goal itself")]
    pub rrt_goal_bias: Option<f64>,

    #[arg(
        long,
        help = "Run each turn's searches concurrently on one shared snapshot",
        default_value_t = false
    )]
    pub concurrent: bool,

    #[arg(long, help = "Write the round summary as JSON to this path")]
    pub output_path: Option<String>,
}

/// Caps and weights for the search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub weight: f64,
    pub rrt_max_iterations: usize,
    pub rrt_goal_bias: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            weight: 2.0,
            rrt_max_iterations: 500,
            rrt_goal_bias: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub grid_size: usize,
    pub goal_count: usize,
    pub max_turns: usize,
    pub seed: u64,
    pub strategies: Vec<StrategyKind>,
    pub concurrent: bool,
    pub output_path: Option<String>,
    pub search: SearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            grid_size: 10,
            goal_count: 12,
            max_turns: 100,
            seed: 0,
            strategies: vec![
                StrategyKind::Random,
                StrategyKind::Greedy,
                StrategyKind::RuleBased,
                StrategyKind::Bfs,
            ],
            concurrent: false,
            output_path: None,
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(grid_size) = cli.grid_size {
            self.grid_size = grid_size;
        }
        if let Some(goal_count) = cli.goal_count {
            self.goal_count = goal_count;
        }
        if let Some(max_turns) = cli.max_turns {
            self.max_turns = max_turns;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if !cli.strategies.is_empty() {
            self.strategies = cli.strategies.clone();
        }
        if let Some(weight) = cli.weight {
            self.search.weight = weight;
        }
        if let Some(rrt_max_iterations) = cli.rrt_max_iterations {
            self.search.rrt_max_iterations = rrt_max_iterations;
        }
        if let Some(rrt_goal_bias) = cli.rrt_goal_bias {
            self.search.rrt_goal_bias = rrt_goal_bias;
        }
        if cli.concurrent {
            self.concurrent = true;
        }
        if cli.output_path.is_some() {
            self.output_path = cli.output_path.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grid_size < 2 {
            return Err(anyhow!(
                "Grid size must be at least 2, got {}",
                self.grid_size
            ));
        }

        if self.strategies.is_empty() || self.strategies.len() > 4 {
            return Err(anyhow!(
                "Between 1 and 4 agents are supported (one per corner), got {}",
                self.strategies.len()
            ));
        }

        // Corners are never goals.
        let capacity = self
            .grid_size
            .checked_mul(self.grid_size)
            .map(|cells| cells - 4)
            .ok_or_else(|| anyhow!("Grid size {} is too large", self.grid_size))?;
        if self.goal_count > capacity {
            return Err(anyhow!(
                "Goal count {} exceeds the {} non-corner cells of a {}x{} grid",
                self.goal_count,
                capacity,
                self.grid_size,
                self.grid_size
            ));
        }

        if self.search.weight.is_nan() || self.search.weight < 1.0 {
            return Err(anyhow!(
                "Weighted A* weight must be at least 1.0, got {}",
                self.search.weight
            ));
        }

        if !(0.0..=1.0).contains(&self.search.rrt_goal_bias) {
            return Err(anyhow!(
                "RRT goal bias must lie in [0, 1], got {}",
                self.search.rrt_goal_bias
            ));
        }

        if self.search.rrt_max_iterations == 0 {
            return Err(anyhow!("RRT iteration cap must be positive"));
        }

        Ok(())
    }
}
