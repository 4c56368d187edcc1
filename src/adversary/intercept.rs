//! Heuristic interception scoring.

use serde::{Deserialize, Serialize};

use super::{Step, candidate_steps};
use crate::{grid::Grid, types::Position};

/// Weights of the interception score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterceptWeights {
    /// Distance at which the approach term reaches zero
    pub approach_reach: f64,
    pub approach: f64,
    /// Per agent move within one step of the candidate
    pub coverage: f64,
    /// Per agent move removed from the four possible escapes
    pub escape: f64,
    /// Distance at which the blocking term reaches zero
    pub block_reach: f64,
    pub block: f64,
    pub capture: f64,
}

impl Default for InterceptWeights {
    fn default() -> Self {
        Self {
            approach_reach: 10.0,
            approach: 5.0,
            coverage: 5.0,
            escape: 3.0,
            block_reach: 3.0,
            block: 6.0,
            capture: 1000.0,
        }
    }
}

/// Score of moving to `candidate` given the cells the agent could move to next.
pub fn score(
    weights: &InterceptWeights,
    candidate: Position,
    agent: Position,
    agent_moves: &[Position],
    goal: Option<Position>,
) -> f64 {
    let distance = |a: Position, b: Position| f64::from(a.manhattan(b));

    let mut total = (weights.approach_reach - distance(candidate, agent)) * weights.approach;

    let covered = agent_moves
        .iter()
        .filter(|&&m| m.manhattan(candidate) <= 1)
        .count();
    total += covered as f64 * weights.coverage;
    let open = agent_moves.len() - covered;
    total += (4.0 - open as f64) * weights.escape;

    if let Some(goal) = goal {
        if let Some(&toward_goal) = agent_moves.iter().min_by_key(|m| m.manhattan(goal)) {
            total += (weights.block_reach - distance(candidate, toward_goal)) * weights.block;
        }
    }

    if candidate == agent {
        total += weights.capture;
    }
    total
}

/// Highest-scoring neighbour move. Earlier moves win ties; `None` only
/// when the adversary has nowhere to go.
pub fn intercept_step(
    grid: &Grid,
    weights: &InterceptWeights,
    from: Position,
    agent: Position,
    goal: Option<Position>,
) -> Option<Step> {
    let agent_moves: Vec<Position> = grid.neighbors(agent).iter().map(|n| n.position).collect();
    let mut best: Option<(f64, Step)> = None;
    for step in candidate_steps(grid, from) {
        let value = score(weights, step.landed, agent, &agent_moves, goal);
        if best.is_none_or(|(best_value, _)| value > best_value) {
            best = Some((value, step));
        }
    }
    best.map(|(_, step)| step)
}
