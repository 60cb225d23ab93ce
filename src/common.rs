use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

pub type Position = (usize, usize);

/// Unit displacement `(dx, dy)`.
pub type Step = (isize, isize);

/// Ordered step sequence from a start cell. Empty means "no path".
pub type Path = Vec<Step>;

pub const STAY: Step = (0, 0);

// Expansion order shared by every 4-connected search.
pub const CARDINAL_STEPS: [Step; 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

pub(crate) fn is_diagonal(step: Step) -> bool {
    step.0 != 0 && step.1 != 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentPosition {
    pub id: usize,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: usize,
    pub position: Position,
    pub strategy: StrategyKind,
    // Only written by the wall follower; lives as long as the agent.
    pub last_direction: Option<Step>,
    pub collected: usize,
}

impl Agent {
    pub fn new(id: usize, position: Position, strategy: StrategyKind) -> Self {
        Agent {
            id,
            position,
            strategy,
            last_direction: None,
            collected: 0,
        }
    }

    pub fn as_position(&self) -> AgentPosition {
        AgentPosition {
            id: self.id,
            position: self.position,
        }
    }
}
