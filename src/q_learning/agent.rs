//! Q-learning and SARSA agents
//!
//! This module implements temporal difference learning agents that use
//! Q-tables to learn policies through sampled transitions.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    config::SolverConfig,
    error::Result,
    exploration::EpsilonSchedule,
    policy::{Policy, ValueTable},
    ports::{Learner, Transition, learner::effective_mask},
    q_learning::q_table::QTable,
    types::{Action, ActionMask, StateId},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TdAgentState {
    pub q_table: QTable,
    pub epsilon: EpsilonSchedule,
    pub rng_seed: Option<u64>,
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Table, exploration schedule and RNG shared by both TD agents.
#[derive(Debug, Clone)]
struct TdCore {
    q_table: QTable,
    epsilon: EpsilonSchedule,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl TdCore {
    fn new(config: &SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            q_table: QTable::new(config.learning_rate, config.discount, config.q_init),
            epsilon: EpsilonSchedule::new(
                config.epsilon,
                config.epsilon_decay,
                config.min_epsilon,
            )?,
            rng: build_rng(config.seed),
            rng_seed: config.seed,
        })
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
    }

    /// ε-greedy action selection, ties among maximal actions broken uniformly
    fn select_action_epsilon_greedy(&mut self, state: StateId, valid: ActionMask) -> Action {
        let valid = effective_mask(valid);
        let candidates = if self.rng.random::<f64>() < self.epsilon.value() {
            // Explore: random action
            valid.actions()
        } else {
            // Exploit: greedy actions based on Q-values
            self.q_table.greedy_actions(state, valid)
        };
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::Up)
    }

    fn greedy_action(&self, state: StateId, valid: ActionMask) -> Action {
        self.q_table
            .greedy_action(state, effective_mask(valid))
            .unwrap_or(Action::Up)
    }

    fn policy(&self, masks: &[ActionMask]) -> Policy {
        Policy::from_actions(
            masks
                .iter()
                .enumerate()
                .map(|(state, &mask)| {
                    if self.q_table.contains(state) && !mask.is_empty() {
                        self.q_table.greedy_action(state, mask)
                    } else {
                        None
                    }
                })
                .collect(),
        )
    }

    fn value_table(&self, masks: &[ActionMask]) -> ValueTable {
        ValueTable::from_vec(
            masks
                .iter()
                .enumerate()
                .map(|(state, &mask)| {
                    if self.q_table.contains(state) && !mask.is_empty() {
                        self.q_table.max_q(state, mask)
                    } else {
                        0.0
                    }
                })
                .collect(),
        )
    }

    fn reset(&mut self) {
        self.q_table.reset();
        self.epsilon.reset();
        self.rng = build_rng(self.rng_seed);
    }

    fn export_state(&self) -> TdAgentState {
        TdAgentState {
            q_table: self.q_table.clone(),
            epsilon: self.epsilon,
            rng_seed: self.rng_seed,
        }
    }

    fn from_state(state: TdAgentState) -> Self {
        Self {
            q_table: state.q_table,
            epsilon: state.epsilon,
            rng: build_rng(state.rng_seed),
            rng_seed: state.rng_seed,
        }
    }
}

/// Q-learning agent (off-policy TD control)
///
/// Learns the optimal Q* function by always updating toward the maximum
/// next-state value, regardless of the action actually taken next.
///
/// # Examples
///
/// ```
/// use gridmdp::{SolverConfig, q_learning::QLearningAgent};
///
/// let agent = QLearningAgent::new(&SolverConfig::new().with_seed(7)).unwrap();
/// assert_eq!(agent.q_table().size(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    core: TdCore,
}

impl QLearningAgent {
    /// Create a new Q-learning agent from validated hyperparameters
    pub fn new(config: &SolverConfig) -> Result<Self> {
        Ok(Self {
            core: TdCore::new(config)?,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.core.seed(seed);
        self
    }

    pub fn q_table(&self) -> &QTable {
        &self.core.q_table
    }

    pub(crate) fn export_state(&self) -> TdAgentState {
        self.core.export_state()
    }

    pub(crate) fn from_state(state: TdAgentState) -> Self {
        Self {
            core: TdCore::from_state(state),
        }
    }
}

impl Learner for QLearningAgent {
    fn select_action(&mut self, state: StateId, valid: ActionMask) -> Result<Action> {
        Ok(self.core.select_action_epsilon_greedy(state, valid))
    }

    fn greedy_action(&self, state: StateId, valid: ActionMask) -> Action {
        self.core.greedy_action(state, valid)
    }

    fn update(&mut self, t: &Transition) -> Result<Option<Action>> {
        self.core.q_table.q_learning_update(
            t.state,
            t.action,
            t.reward,
            t.next_state,
            t.next_valid,
            t.done,
        );
        Ok(None)
    }

    fn end_episode(&mut self) {
        self.core.epsilon.decay();
    }

    fn name(&self) -> &str {
        "Q-Learning"
    }

    fn policy(&self, masks: &[ActionMask]) -> Policy {
        self.core.policy(masks)
    }

    fn value_table(&self, masks: &[ActionMask]) -> ValueTable {
        self.core.value_table(masks)
    }

    fn epsilon(&self) -> Option<f64> {
        Some(self.core.epsilon.value())
    }

    fn reset(&mut self) -> Result<()> {
        self.core.reset();
        Ok(())
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.core.seed(seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// SARSA agent (on-policy TD control)
///
/// Learns Q^π for the policy it follows (including exploration). The next
/// action is chosen inside [`Learner::update`] and handed back to the
/// runner, so the bootstrap uses exactly the action taken next.
#[derive(Debug, Clone)]
pub struct SarsaAgent {
    core: TdCore,
}

impl SarsaAgent {
    /// Create a new SARSA agent from validated hyperparameters
    pub fn new(config: &SolverConfig) -> Result<Self> {
        Ok(Self {
            core: TdCore::new(config)?,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.core.seed(seed);
        self
    }

    pub fn q_table(&self) -> &QTable {
        &self.core.q_table
    }

    pub(crate) fn export_state(&self) -> TdAgentState {
        self.core.export_state()
    }

    pub(crate) fn from_state(state: TdAgentState) -> Self {
        Self {
            core: TdCore::from_state(state),
        }
    }
}

impl Learner for SarsaAgent {
    fn select_action(&mut self, state: StateId, valid: ActionMask) -> Result<Action> {
        Ok(self.core.select_action_epsilon_greedy(state, valid))
    }

    fn greedy_action(&self, state: StateId, valid: ActionMask) -> Action {
        self.core.greedy_action(state, valid)
    }

    fn update(&mut self, t: &Transition) -> Result<Option<Action>> {
        let next_action = if t.done {
            None
        } else {
            Some(
                self.core
                    .select_action_epsilon_greedy(t.next_state, t.next_valid),
            )
        };
        self.core
            .q_table
            .sarsa_update(t.state, t.action, t.reward, t.next_state, next_action);
        Ok(next_action)
    }

    fn end_episode(&mut self) {
        self.core.epsilon.decay();
    }

    fn name(&self) -> &str {
        "SARSA"
    }

    fn policy(&self, masks: &[ActionMask]) -> Policy {
        self.core.policy(masks)
    }

    fn value_table(&self, masks: &[ActionMask]) -> ValueTable {
        self.core.value_table(masks)
    }

    fn epsilon(&self) -> Option<f64> {
        Some(self.core.epsilon.value())
    }

    fn reset(&mut self) -> Result<()> {
        self.core.reset();
        Ok(())
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.core.seed(seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SolverConfig {
        SolverConfig::new()
            .with_learning_rate(0.5)
            .with_discount(0.9)
            .with_seed(3)
    }

    #[test]
    fn test_greedy_selection_breaks_ties_first() {
        let agent = QLearningAgent::new(&config()).unwrap();
        assert_eq!(agent.greedy_action(0, ActionMask::ALL), Action::Up);
        let mask = ActionMask::new([false, false, true, true]);
        assert_eq!(agent.greedy_action(0, mask), Action::Down);
    }

    #[test]
    fn test_exploitation_picks_among_tied_maxima_only() {
        let mut agent = QLearningAgent::new(&config().with_epsilon(0.0, 1.0, 0.0)).unwrap();
        agent.core.q_table.set(0, Action::Right, 1.0);
        agent.core.q_table.set(0, Action::Left, 1.0);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[agent.select_action(0, ActionMask::ALL).unwrap().index()] = true;
        }
        assert_eq!(seen, [false, true, false, true]);
    }

    #[test]
    fn test_selection_respects_mask_when_exploring() {
        let mut agent = SarsaAgent::new(&config().with_epsilon(1.0, 1.0, 0.0)).unwrap();
        let mask = ActionMask::new([false, true, false, false]);
        for _ in 0..50 {
            assert_eq!(agent.select_action(5, mask).unwrap(), Action::Right);
        }
    }

    #[test]
    fn test_sarsa_returns_the_action_it_bootstrapped_on() {
        let mut agent = SarsaAgent::new(&config().with_epsilon(0.0, 1.0, 0.0)).unwrap();
        agent.core.q_table.set(1, Action::Down, 4.0);
        let next = agent
            .update(&Transition {
                state: 0,
                action: Action::Right,
                reward: -1.0,
                next_state: 1,
                done: false,
                next_valid: ActionMask::ALL,
            })
            .unwrap();
        assert_eq!(next, Some(Action::Down));
        // 0.5 * (-1 + 0.9 * 4)
        assert!((agent.q_table().get(0, Action::Right) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_epsilon_decays_per_episode() {
        let mut agent = QLearningAgent::new(&config().with_epsilon(0.2, 0.5, 0.01)).unwrap();
        agent.end_episode();
        assert!((agent.epsilon().unwrap() - 0.1).abs() < 1e-12);
        agent.reset().unwrap();
        assert_eq!(agent.epsilon(), Some(0.2));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let too_fast = SolverConfig::new().with_learning_rate(2.0);
        assert!(QLearningAgent::new(&too_fast).is_err());
        let myopic = SolverConfig::new().with_discount(0.0);
        assert!(SarsaAgent::new(&myopic).is_err());
    }

    #[test]
    fn test_policy_only_covers_visited_states() {
        let mut agent = QLearningAgent::new(&config()).unwrap();
        agent.core.q_table.set(1, Action::Left, 2.0);
        let masks = vec![ActionMask::ALL; 3];
        let policy = agent.policy(&masks);
        assert_eq!(policy.action(0), None);
        assert_eq!(policy.action(1), Some(Action::Left));
        assert_eq!(agent.value_table(&masks).get(1), 2.0);
    }
}
