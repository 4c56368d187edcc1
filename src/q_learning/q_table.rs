//! Q-table implementation for temporal difference learning

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Action, ActionMask, StateId, constants::ACTION_COUNT};

/// Q-table mapping states to one value per action
///
/// Rows are materialized on first write; unseen states read as `q_init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    /// Q-values: state -> [up, right, down, left]
    rows: HashMap<StateId, [f64; ACTION_COUNT]>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
    /// Initial Q-value for unseen state-action pairs
    q_init: f64,
}

impl QTable {
    /// Create a new Q-table
    pub fn new(learning_rate: f64, discount_factor: f64, q_init: f64) -> Self {
        Self {
            rows: HashMap::new(),
            learning_rate,
            discount_factor,
            q_init,
        }
    }

    /// The action values of `state` (initial values if unseen)
    pub fn row(&self, state: StateId) -> [f64; ACTION_COUNT] {
        self.rows
            .get(&state)
            .copied()
            .unwrap_or([self.q_init; ACTION_COUNT])
    }

    fn row_mut(&mut self, state: StateId) -> &mut [f64; ACTION_COUNT] {
        let q_init = self.q_init;
        self.rows.entry(state).or_insert([q_init; ACTION_COUNT])
    }

    /// Whether `state` has been written to
    pub fn contains(&self, state: StateId) -> bool {
        self.rows.contains_key(&state)
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: StateId, action: Action) -> f64 {
        self.row(state)[action.index()]
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: StateId, action: Action, value: f64) {
        self.row_mut(state)[action.index()] = value;
    }

    /// Get maximum Q-value over valid actions in a state
    pub fn max_q(&self, state: StateId, valid: ActionMask) -> f64 {
        let row = self.row(state);
        valid
            .actions()
            .into_iter()
            .map(|action| row[action.index()])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Every valid action whose value equals the row maximum, in index order
    pub fn greedy_actions(&self, state: StateId, valid: ActionMask) -> Vec<Action> {
        let best = self.max_q(state, valid);
        let row = self.row(state);
        valid
            .actions()
            .into_iter()
            .filter(|action| row[action.index()] == best)
            .collect()
    }

    /// Select the first greedy action (lowest index among the maxima)
    pub fn greedy_action(&self, state: StateId, valid: ActionMask) -> Option<Action> {
        self.greedy_actions(state, valid).first().copied()
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Terminal transitions do not bootstrap.
    pub fn q_learning_update(
        &mut self,
        state: StateId,
        action: Action,
        reward: f64,
        next_state: StateId,
        next_valid: ActionMask,
        done: bool,
    ) {
        let current_q = self.get(state, action);
        let max_next_q = if done || next_valid.is_empty() {
            0.0
        } else {
            self.max_q(next_state, next_valid)
        };
        let td_target = reward + self.discount_factor * max_next_q;
        let td_error = td_target - current_q;
        let new_q = current_q + self.learning_rate * td_error;
        self.set(state, action, new_q);
    }

    /// SARSA update: on-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ Q(s',a') - Q(s,a)]
    ///
    /// `next_action` is `None` for terminal transitions, which do not bootstrap.
    pub fn sarsa_update(
        &mut self,
        state: StateId,
        action: Action,
        reward: f64,
        next_state: StateId,
        next_action: Option<Action>,
    ) {
        let current_q = self.get(state, action);
        let next_q = next_action.map_or(0.0, |next| self.get(next_state, next));
        let td_target = reward + self.discount_factor * next_q;
        let td_error = td_target - current_q;
        let new_q = current_q + self.learning_rate * td_error;
        self.set(state, action, new_q);
    }

    /// Reset all Q-values (for episodic learning)
    pub fn reset(&mut self) {
        self.rows.clear();
    }

    /// Number of materialized states
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qtable_initialization() {
        let qtable = QTable::new(0.5, 0.99, 0.0);
        assert_eq!(qtable.get(7, Action::Up), 0.0);
        assert_eq!(qtable.size(), 0);
        let optimistic = QTable::new(0.5, 0.99, 2.0);
        assert_eq!(optimistic.row(3), [2.0; 4]);
    }

    #[test]
    fn test_qtable_set_get() {
        let mut qtable = QTable::new(0.5, 0.99, 0.0);
        qtable.set(4, Action::Left, 1.5);
        assert_eq!(qtable.get(4, Action::Left), 1.5);
        assert_eq!(qtable.get(4, Action::Up), 0.0);
        assert_eq!(qtable.size(), 1);
    }

    #[test]
    fn test_max_q_respects_mask() {
        let mut qtable = QTable::new(0.5, 0.99, 0.0);
        qtable.set(0, Action::Up, 0.5);
        qtable.set(0, Action::Right, 1.5);
        qtable.set(0, Action::Down, 0.8);
        assert_eq!(qtable.max_q(0, ActionMask::ALL), 1.5);
        let no_right = ActionMask::new([true, false, true, true]);
        assert_eq!(qtable.max_q(0, no_right), 0.8);
        assert_eq!(qtable.greedy_action(0, no_right), Some(Action::Down));
    }

    #[test]
    fn test_greedy_actions_lists_ties_in_order() {
        let mut qtable = QTable::new(0.5, 0.99, 0.0);
        qtable.set(2, Action::Right, 1.0);
        qtable.set(2, Action::Left, 1.0);
        assert_eq!(
            qtable.greedy_actions(2, ActionMask::ALL),
            vec![Action::Right, Action::Left]
        );
        let best = qtable.greedy_action(2, ActionMask::ALL);
        assert_eq!(best, Some(Action::Right));
        assert_eq!(qtable.greedy_action(2, ActionMask::default()), None);
    }

    #[test]
    fn test_q_learning_update() {
        let mut qtable = QTable::new(0.5, 0.9, 0.0);
        qtable.set(1, Action::Up, 2.0);
        qtable.q_learning_update(0, Action::Right, 1.0, 1, ActionMask::ALL, false);
        // 0 + 0.5 * (1 + 0.9 * 2 - 0)
        assert!((qtable.get(0, Action::Right) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_updates_do_not_bootstrap() {
        let mut q = QTable::new(0.1, 0.9, 0.0);
        let mut sarsa = QTable::new(0.1, 0.9, 0.0);
        for table in [&mut q, &mut sarsa] {
            table.set(0, Action::Down, 3.0);
            table.set(5, Action::Up, 50.0);
        }
        q.q_learning_update(0, Action::Down, 10.0, 5, ActionMask::ALL, true);
        sarsa.sarsa_update(0, Action::Down, 10.0, 5, None);
        let expected = 3.0 + 0.1 * (10.0 - 3.0);
        assert_eq!(q.get(0, Action::Down), expected);
        assert_eq!(sarsa.get(0, Action::Down), expected);
    }

    #[test]
    fn test_sarsa_update_uses_chosen_action() {
        let mut qtable = QTable::new(0.5, 0.9, 0.0);
        qtable.set(1, Action::Up, 2.0);
        qtable.set(1, Action::Down, -2.0);
        qtable.sarsa_update(0, Action::Right, 0.0, 1, Some(Action::Down));
        assert!((qtable.get(0, Action::Right) + 0.9).abs() < 1e-12);
    }
}
