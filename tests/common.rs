//! Common test utilities for the gridmdp test suite.
//!
//! Small environment builders and float comparisons shared by the
//! integration tests.

#![allow(dead_code)]

use gridmdp::{
    env::{EnvConfig, GridEnvironment, RewardTable},
    grid::Layout,
    types::{ActionMask, Position},
};

/// Compare two floats within an absolute tolerance.
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// An open `size` x `size` field from the top-left corner to the bottom-right.
pub fn open_env(size: usize, config: EnvConfig) -> GridEnvironment {
    let last = size as i32 - 1;
    let layout = Layout::open_field(size, Position::new(0, 0), Position::new(last, last))
        .expect("open field layout");
    GridEnvironment::new(layout, config).expect("open field environment")
}

/// Goal +100, move -1 and a -50 timeout after `max_steps`.
pub fn small_rewards(max_steps: usize) -> EnvConfig {
    EnvConfig::new(max_steps).with_rewards(RewardTable {
        move_cost: -1.0,
        wall_bump: -1.0,
        goal: 100.0,
        timeout: -50.0,
        ..RewardTable::default()
    })
}

/// Build an environment from a text layout.
pub fn parsed_env(text: &str, config: EnvConfig) -> GridEnvironment {
    let layout = Layout::parse(text).expect("valid layout");
    GridEnvironment::new(layout, config).expect("valid environment")
}

/// Valid-action masks of every encoded state.
pub fn masks(env: &GridEnvironment) -> Vec<ActionMask> {
    (0..env.state_count())
        .map(|state| env.valid_actions(state).expect("state in range"))
        .collect()
}
