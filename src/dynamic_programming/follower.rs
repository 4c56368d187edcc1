//! A fixed policy exposed through the [`Learner`] port.

use crate::{
    error::Result,
    policy::{Policy, ValueTable},
    ports::{Learner, learner::effective_mask},
    types::{Action, ActionMask, StateId},
};

/// Follows a precomputed policy and never learns.
///
/// States the policy leaves undefined, or where its action is not valid,
/// fall back to the first valid action.
#[derive(Debug, Clone)]
pub struct PolicyFollower {
    name: String,
    policy: Policy,
    values: ValueTable,
}

impl PolicyFollower {
    pub fn new(name: impl Into<String>, policy: Policy, values: ValueTable) -> Self {
        Self {
            name: name.into(),
            policy,
            values,
        }
    }

    pub fn inner_policy(&self) -> &Policy {
        &self.policy
    }
}

impl Learner for PolicyFollower {
    fn select_action(&mut self, state: StateId, valid: ActionMask) -> Result<Action> {
        Ok(self.greedy_action(state, valid))
    }

    fn greedy_action(&self, state: StateId, valid: ActionMask) -> Action {
        let valid = effective_mask(valid);
        self.policy
            .action(state)
            .filter(|&action| valid.allows(action))
            .or_else(|| valid.actions().first().copied())
            .unwrap_or(Action::Up)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self, _masks: &[ActionMask]) -> Policy {
        self.policy.clone()
    }

    fn value_table(&self, _masks: &[ActionMask]) -> ValueTable {
        self.values.clone()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_policy_and_falls_back_to_first_valid() {
        let policy = Policy::from_actions(vec![Some(Action::Left), None]);
        let mut follower = PolicyFollower::new("fixed", policy, ValueTable::zeros(2));
        let first = follower.select_action(0, ActionMask::ALL).unwrap();
        assert_eq!(first, Action::Left);

        let no_left = ActionMask::new([false, false, true, false]);
        assert_eq!(follower.greedy_action(0, no_left), Action::Down);
        assert_eq!(follower.greedy_action(1, ActionMask::ALL), Action::Up);
        assert_eq!(follower.epsilon(), None);
        assert_eq!(follower.name(), "fixed");
    }
}
