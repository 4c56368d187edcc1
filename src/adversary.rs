//! Rule-based adversary: patrol, BFS chase, flee and heuristic interception.
//!
//! The adversary moves once per environment step, after the agent. Which
//! rule runs is fixed by the [`AdversaryPolicy`]; a pursuit adversary
//! switches between chase and flee purely on whether the agent is powered.

pub mod chase;
pub mod controller;
pub mod flee;
pub mod intercept;
pub mod patrol;
pub mod state;

use serde::{Deserialize, Serialize};

pub use controller::{AdversaryController, AdversaryMode, AdversaryMove, AdversaryView};
pub use intercept::InterceptWeights;
pub use state::AdversaryState;

use crate::{
    Error, Result,
    grid::{CellType, Grid},
    types::Position,
};

/// Movement rule of the adversary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdversaryPolicy {
    /// Walk the waypoints in order, waiting `wait_turns` at each.
    Patrol {
        waypoints: Vec<Position>,
        wait_turns: u32,
    },
    /// Chase the agent, or flee while it is powered. Fleeing moves on one
    /// call out of every `flee_every`.
    Pursuit { flee_every: u32 },
    /// Score each neighbour move with [`InterceptWeights`].
    Interceptor { weights: InterceptWeights },
}

impl AdversaryPolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            AdversaryPolicy::Patrol { waypoints, .. } if waypoints.is_empty() => {
                Err(Error::InvalidConfiguration {
                    message: "patrol needs at least one waypoint".to_string(),
                })
            }
            AdversaryPolicy::Pursuit { flee_every: 0 } => Err(Error::InvalidConfiguration {
                message: "flee_every must be at least 1".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// A single adversary move: the cell stepped onto and where it ended up
/// after any teleporter warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub stepped: Position,
    pub landed: Position,
}

/// Cells the adversary may enter. Active freeze tiles block it.
pub fn can_enter(grid: &Grid, pos: Position) -> bool {
    grid.is_walkable(pos) && grid.cell_type(pos) != CellType::Freeze
}

/// Enterable neighbour moves of `from` in action order, teleporter-resolved.
pub(crate) fn candidate_steps(grid: &Grid, from: Position) -> Vec<Step> {
    grid.neighbors(from)
        .into_iter()
        .filter(|n| can_enter(grid, n.position))
        .map(|n| Step {
            stepped: n.position,
            landed: grid.warp(n.position),
        })
        .collect()
}
