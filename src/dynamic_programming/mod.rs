//! Model-based planning over an enumerated [`TransitionModel`]
//!
//! Both planners sweep every encoded state of the model:
//!
//! - **Value iteration**: synchronous Bellman-optimality backups until the
//!   largest change drops below θ.
//! - **Policy iteration**: alternate full evaluation of a deterministic
//!   policy with a tolerance-aware improvement pass until no state changes
//!   its action.
//!
//! Slip tiles are expected over every valid direction, so the planners
//! value them as the agent sees them on average.
//!
//! ## Usage Example
//!
//! ```no_run
//! use gridmdp::{
//!     SolverConfig,
//!     dynamic_programming::ValueIteration,
//!     env::{Scenario, TransitionModel},
//! };
//!
//! let env = Scenario::LavaField.build(Some(7)).unwrap();
//! let model = TransitionModel::from_env(&env).unwrap();
//! let mut planner = ValueIteration::new(model, &SolverConfig::new().with_discount(0.99)).unwrap();
//! let report = planner.solve();
//! assert!(report.converged);
//! ```

pub mod follower;
pub mod policy_iteration;
pub mod value_iteration;

use serde::{Deserialize, Serialize};

pub use follower::PolicyFollower;
pub use policy_iteration::PolicyIteration;
pub use value_iteration::ValueIteration;

use crate::{
    env::TransitionModel,
    ports::learner::effective_mask,
    types::{Action, ActionMask, StateId, constants::ACTION_COUNT},
};

/// How a planner run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Value sweeps, summed over every evaluation phase for policy iteration
    pub sweeps: usize,
    /// Improvement passes (0 for value iteration)
    pub improvement_passes: usize,
    pub converged: bool,
    /// Largest value change in the last sweep
    pub delta: f64,
}

/// Actions a planner may assign in `state`. Terminal states have none; a
/// non-terminal cell boxed in by walls may pick any action (each bumps).
pub(crate) fn candidate_actions(model: &TransitionModel, state: StateId) -> ActionMask {
    if model.is_terminal(state) {
        ActionMask::default()
    } else {
        effective_mask(model.valid_actions(state))
    }
}

/// Expected return of every action, `NEG_INFINITY` outside `mask`.
pub(crate) fn action_values(
    model: &TransitionModel,
    state: StateId,
    mask: ActionMask,
    values: &[f64],
    gamma: f64,
) -> [f64; ACTION_COUNT] {
    let mut q = [f64::NEG_INFINITY; ACTION_COUNT];
    for action in mask.actions() {
        q[action.index()] = model.action_value(state, action, values, gamma);
    }
    q
}

/// First maximal action in index order, with its value.
pub(crate) fn greedy(
    model: &TransitionModel,
    state: StateId,
    values: &[f64],
    gamma: f64,
) -> Option<(Action, f64)> {
    let mask = candidate_actions(model, state);
    let q = action_values(model, state, mask, values, gamma);
    let mut best: Option<(Action, f64)> = None;
    for action in mask.actions() {
        let value = q[action.index()];
        if best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((action, value));
        }
    }
    best
}
