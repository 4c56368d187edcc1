//! Shared argument types for CLI commands

use clap::{Args, ValueEnum};

use crate::{SolverConfig, env::Scenario};

/// Named scenario, as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    /// 10x10 open field, goal in the far corner
    OpenField,
    /// Key, vault and exit guarded by a patrol
    EscapeRoom,
    /// Race an interceptor to the goal, freeze tiles stop it
    FreezeChase,
    /// Generated lava field with slip tiles
    LavaField,
    /// Two pickups power the agent up against a chaser
    PelletPursuit,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::OpenField => Scenario::OpenField,
            ScenarioArg::EscapeRoom => Scenario::EscapeRoom,
            ScenarioArg::FreezeChase => Scenario::FreezeChase,
            ScenarioArg::LavaField => Scenario::LavaField,
            ScenarioArg::PelletPursuit => Scenario::PelletPursuit,
        }
    }
}

/// Solver hyperparameters shared by the train and solve commands
#[derive(Args, Debug, Clone)]
pub struct HyperParams {
    /// Learning rate α (0.0-1.0)
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    /// Discount factor γ (0.0-1.0)
    #[arg(long, default_value_t = 0.9)]
    pub discount: f64,

    /// Initial epsilon (exploration rate)
    #[arg(long, default_value_t = 0.2)]
    pub epsilon: f64,

    /// Epsilon decay per episode
    #[arg(long, default_value_t = 0.995)]
    pub epsilon_decay: f64,

    /// Minimum epsilon
    #[arg(long, default_value_t = 0.01)]
    pub min_epsilon: f64,

    /// Convergence threshold for the planners
    #[arg(long, default_value_t = 1e-4)]
    pub theta: f64,

    /// Sweep cap for value iteration and each policy evaluation
    #[arg(long, default_value_t = 1000)]
    pub max_iterations: usize,

    /// Initial Q-value of unseen state-action pairs
    #[arg(long, default_value_t = 0.0)]
    pub q_init: f64,
}

impl HyperParams {
    pub fn solver_config(&self, seed: Option<u64>) -> SolverConfig {
        let config = SolverConfig::new()
            .with_learning_rate(self.learning_rate)
            .with_discount(self.discount)
            .with_epsilon(self.epsilon, self.epsilon_decay, self.min_epsilon)
            .with_theta(self.theta)
            .with_max_iterations(self.max_iterations)
            .with_q_init(self.q_init);
        match seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

impl Default for HyperParams {
    fn default() -> Self {
        let defaults = SolverConfig::default();
        Self {
            learning_rate: defaults.learning_rate,
            discount: defaults.discount,
            epsilon: defaults.epsilon,
            epsilon_decay: defaults.epsilon_decay,
            min_epsilon: defaults.min_epsilon,
            theta: defaults.theta,
            max_iterations: defaults.max_iterations,
            q_init: defaults.q_init,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyper_params_match_solver_defaults() {
        let config = HyperParams::default().solver_config(Some(3));
        assert_eq!(config, SolverConfig::new().with_seed(3));
    }

    #[test]
    fn test_scenario_args_map_onto_every_scenario() {
        let mapped: Vec<Scenario> = ScenarioArg::value_variants()
            .iter()
            .map(|&arg| arg.into())
            .collect();
        assert_eq!(mapped, Scenario::ALL.to_vec());
    }
}
