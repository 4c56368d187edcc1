//! Policy iteration

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use tracing::{debug, info, warn};

use super::{SolveReport, action_values, candidate_actions};
use crate::{
    config::SolverConfig,
    dynamic_programming::PolicyFollower,
    env::TransitionModel,
    error::Result,
    policy::{Policy, ValueTable},
    types::{
        Action,
        constants::{ACTION_COUNT, POLICY_TOLERANCE},
    },
};

/// Policy iteration over a deterministic policy.
///
/// Every non-terminal state starts with a random valid action. Improvement
/// keeps the current action while it stays within [`POLICY_TOLERANCE`] of the
/// best action value. Otherwise it returns to the state's initial action if
/// that one is near-optimal, else it takes the first near-optimal action.
#[derive(Debug, Clone)]
pub struct PolicyIteration {
    model: TransitionModel,
    gamma: f64,
    theta: f64,
    max_iterations: usize,
    values: ValueTable,
    policy: Policy,
    initial: Vec<Option<Action>>,
    evaluation_sweeps: usize,
    improvement_passes: usize,
}

impl PolicyIteration {
    /// Create a planner with a random initial policy. `config.seed` fixes
    /// the draw.
    pub fn new(model: TransitionModel, config: &SolverConfig) -> Result<Self> {
        config.validate_for_planning()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let initial: Vec<Option<Action>> = (0..model.state_count())
            .map(|state| {
                candidate_actions(&model, state)
                    .actions()
                    .choose(&mut rng)
                    .copied()
            })
            .collect();

        Ok(Self {
            gamma: config.discount,
            theta: config.theta,
            max_iterations: config.max_iterations,
            values: ValueTable::zeros(model.state_count()),
            policy: Policy::from_actions(initial.clone()),
            initial,
            evaluation_sweeps: 0,
            improvement_passes: 0,
            model,
        })
    }

    /// Evaluate the current policy until the largest change falls below θ.
    ///
    /// Returns the final delta. Hitting the sweep cap is logged and the
    /// partially evaluated values are kept.
    pub fn evaluate(&mut self) -> f64 {
        let mut delta = f64::INFINITY;
        for _ in 0..self.max_iterations {
            let old = self.values.as_slice();
            let next: Vec<f64> = (0..self.model.state_count())
                .map(|state| match self.policy.action(state) {
                    Some(action) => self.model.action_value(state, action, old, self.gamma),
                    None => 0.0,
                })
                .collect();
            let next = ValueTable::from_vec(next);
            delta = next.max_difference(&self.values);
            self.values = next;
            self.evaluation_sweeps += 1;
            if delta < self.theta {
                return delta;
            }
        }
        warn!(
            sweeps = self.max_iterations,
            delta, "policy evaluation hit the sweep cap before converging"
        );
        delta
    }

    /// One improvement pass. Returns how many states changed their action.
    pub fn improve(&mut self) -> usize {
        let mut changes = 0;
        for state in 0..self.model.state_count() {
            let Some(current) = self.policy.action(state) else {
                continue;
            };
            let mask = candidate_actions(&self.model, state);
            let q = action_values(&self.model, state, mask, self.values.as_slice(), self.gamma);
            let best = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let near_optimal = |action: Action| q[action.index()] >= best - POLICY_TOLERANCE;

            if near_optimal(current) {
                continue;
            }
            let replacement = self.initial[state]
                .filter(|&initial| near_optimal(initial))
                .or_else(|| mask.actions().into_iter().find(|&a| near_optimal(a)));
            if let Some(action) = replacement {
                self.policy.set(state, Some(action));
                changes += 1;
            }
        }
        self.improvement_passes += 1;
        changes
    }

    /// Alternate evaluation and improvement until the policy is stable.
    ///
    /// Passes are capped at `states x actions`, the bound on distinct
    /// improving switches.
    pub fn solve(&mut self) -> SolveReport {
        let pass_cap = (self.model.state_count() * ACTION_COUNT).max(1);
        let mut delta = f64::INFINITY;
        let mut converged = false;
        while self.improvement_passes < pass_cap {
            delta = self.evaluate();
            let changes = self.improve();
            debug!(
                pass = self.improvement_passes,
                changes, delta, "policy improvement pass"
            );
            if changes == 0 {
                converged = true;
                break;
            }
        }

        if converged {
            info!(
                passes = self.improvement_passes,
                sweeps = self.evaluation_sweeps,
                "policy iteration converged"
            );
        } else {
            warn!(
                passes = self.improvement_passes,
                "policy iteration hit the pass cap before the policy stabilized"
            );
        }
        SolveReport {
            sweeps: self.evaluation_sweeps,
            improvement_passes: self.improvement_passes,
            converged,
            delta,
        }
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn model(&self) -> &TransitionModel {
        &self.model
    }

    pub fn follower(&self) -> PolicyFollower {
        PolicyFollower::new("Policy Iteration", self.policy.clone(), self.values.clone())
    }
}
