use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Mutable adversary state, reset to the start cell every episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdversaryState {
    pub position: Position,
    /// Index of the waypoint last reached (patrol only)
    pub patrol_index: usize,
    /// Turns left to wait at the current waypoint
    pub wait: u32,
    /// Turns left frozen
    pub frozen: u32,
    /// Flee throttle counter, cycles through `0..flee_every`
    pub throttle: u32,
}

impl AdversaryState {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            patrol_index: 0,
            wait: 0,
            frozen: 0,
            throttle: 0,
        }
    }
}
