use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub searches: usize,
    pub expanded_nodes: usize,
    pub rrt_iterations: usize,
    pub time_us: usize,
}

impl Stats {
    pub fn merge(&mut self, other: &Stats) {
        self.searches += other.searches;
        self.expanded_nodes += other.expanded_nodes;
        self.rrt_iterations += other.rrt_iterations;
        self.time_us += other.time_us;
    }

    pub fn print(&self) {
        info!(
            "Searches {:?} Expanded nodes {:?} RRT iterations {:?} Time(microseconds) {:?}",
            self.searches, self.expanded_nodes, self.rrt_iterations, self.time_us
        );
    }
}
