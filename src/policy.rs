//! Deterministic policies and state-value tables.

use serde::{Deserialize, Serialize};

use crate::{
    env::StateSpace,
    types::{Action, StateId, constants::ACTION_COUNT},
};

/// State-value estimates indexed by state id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable(Vec<f64>);

impl ValueTable {
    pub fn zeros(state_count: usize) -> Self {
        Self(vec![0.0; state_count])
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, state: StateId) -> f64 {
        self.0.get(state).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest absolute difference to another table of the same length.
    pub fn max_difference(&self, other: &ValueTable) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// A deterministic policy: at most one action per state. `None` marks
/// terminal or unvisited states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    actions: Vec<Option<Action>>,
}

impl Policy {
    pub fn new(state_count: usize) -> Self {
        Self {
            actions: vec![None; state_count],
        }
    }

    pub fn from_actions(actions: Vec<Option<Action>>) -> Self {
        Self { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action(&self, state: StateId) -> Option<Action> {
        self.actions.get(state).copied().flatten()
    }

    pub fn set(&mut self, state: StateId, action: Option<Action>) {
        if let Some(slot) = self.actions.get_mut(state) {
            *slot = action;
        }
    }

    /// Action-probability vector: one-hot, or all zeros where undefined.
    pub fn probabilities(&self, state: StateId) -> [f64; ACTION_COUNT] {
        let mut probabilities = [0.0; ACTION_COUNT];
        if let Some(action) = self.action(state) {
            probabilities[action.index()] = 1.0;
        }
        probabilities
    }

    /// Arrow map of one flag layer, one grid row per line.
    pub fn render(&self, space: &StateSpace, layer: usize) -> String {
        let size = space.size();
        let offset = layer * space.position_count();
        let mut out = String::with_capacity(size * (size + 1) * 3);
        for y in 0..size {
            for x in 0..size {
                let glyph = self
                    .action(offset + x + y * size)
                    .map_or('·', Action::arrow);
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probabilities_are_one_hot() {
        let mut policy = Policy::new(3);
        policy.set(1, Some(Action::Down));
        assert_eq!(policy.probabilities(1), [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(policy.probabilities(0), [0.0; 4]);
        assert_eq!(policy.probabilities(99), [0.0; 4]);
    }

    #[test]
    fn test_render_arrows() {
        let space = StateSpace::new(2, 0);
        let policy = Policy::from_actions(vec![
            Some(Action::Right),
            Some(Action::Down),
            Some(Action::Right),
            None,
        ]);
        assert_eq!(policy.render(&space, 0), "→↓\n→·\n");
    }

    #[test]
    fn test_max_difference() {
        let a = ValueTable::from_vec(vec![1.0, 2.0, 3.0]);
        let b = ValueTable::from_vec(vec![1.5, 2.0, 1.0]);
        assert_eq!(a.max_difference(&b), 2.0);
    }
}
