//! Value iteration

use tracing::{debug, info, warn};

use super::{SolveReport, action_values, candidate_actions, greedy};
use crate::{
    config::SolverConfig,
    dynamic_programming::PolicyFollower,
    env::TransitionModel,
    error::Result,
    policy::{Policy, ValueTable},
    types::{StateId, constants::ACTION_COUNT},
};

/// Synchronous value iteration.
///
/// Every sweep computes `V(s) = max_a E[r + γ V(s')]` from the previous
/// sweep's table and then refreshes the greedy policy from the new values.
#[derive(Debug, Clone)]
pub struct ValueIteration {
    model: TransitionModel,
    gamma: f64,
    theta: f64,
    max_iterations: usize,
    values: ValueTable,
    policy: Policy,
    sweeps: usize,
}

impl ValueIteration {
    /// Create a planner with all values at zero.
    ///
    /// # Errors
    ///
    /// Rejects configurations that fail [`SolverConfig::validate_for_planning`].
    pub fn new(model: TransitionModel, config: &SolverConfig) -> Result<Self> {
        config.validate_for_planning()?;
        let count = model.state_count();
        Ok(Self {
            model,
            gamma: config.discount,
            theta: config.theta,
            max_iterations: config.max_iterations,
            values: ValueTable::zeros(count),
            policy: Policy::new(count),
            sweeps: 0,
        })
    }

    /// One synchronous Bellman-optimality sweep. Returns `max_s |ΔV(s)|`.
    pub fn sweep(&mut self) -> f64 {
        let old = self.values.as_slice();
        let next: Vec<f64> = (0..self.model.state_count())
            .map(|state| greedy(&self.model, state, old, self.gamma).map_or(0.0, |(_, v)| v))
            .collect();
        let next = ValueTable::from_vec(next);
        let delta = next.max_difference(&self.values);
        self.values = next;
        self.refresh_policy();
        self.sweeps += 1;
        delta
    }

    fn refresh_policy(&mut self) {
        let values = self.values.as_slice();
        self.policy = Policy::from_actions(
            (0..self.model.state_count())
                .map(|state| greedy(&self.model, state, values, self.gamma).map(|(a, _)| a))
                .collect(),
        );
    }

    /// Sweep until the largest change falls below θ or the sweep cap is hit.
    pub fn solve(&mut self) -> SolveReport {
        let mut delta = f64::INFINITY;
        let mut converged = false;
        while self.sweeps < self.max_iterations {
            delta = self.sweep();
            debug!(sweep = self.sweeps, delta, "value iteration sweep");
            if delta < self.theta {
                converged = true;
                break;
            }
        }

        if converged {
            info!(sweeps = self.sweeps, delta, "value iteration converged");
        } else {
            warn!(
                sweeps = self.sweeps,
                delta,
                theta = self.theta,
                "value iteration hit the sweep cap before converging"
            );
        }
        SolveReport {
            sweeps: self.sweeps,
            improvement_passes: 0,
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

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Expected return of each action under the current values.
    /// Actions that cannot be taken read as `NEG_INFINITY`.
    pub fn action_values(&self, state: StateId) -> [f64; ACTION_COUNT] {
        action_values(
            &self.model,
            state,
            candidate_actions(&self.model, state),
            self.values.as_slice(),
            self.gamma,
        )
    }

    /// Freeze the current policy into a runnable learner.
    pub fn follower(&self) -> PolicyFollower {
        PolicyFollower::new("Value Iteration", self.policy.clone(), self.values.clone())
    }
}
