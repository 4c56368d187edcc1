//! Learner port - abstraction over the solvers the episode runner can drive
//!
//! This port defines the interface that every policy source implements,
//! allowing the same runner to work with:
//! - Model-free learners (Q-learning, SARSA)
//! - Planned policies (value iteration, policy iteration)

use crate::{
    Result,
    policy::{Policy, ValueTable},
    types::{Action, ActionMask, StateId},
};

/// One sampled transition, as handed to [`Learner::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: StateId,
    pub action: Action,
    pub reward: f64,
    pub next_state: StateId,
    pub done: bool,
    /// Valid actions in `next_state`
    pub next_valid: ActionMask,
}

/// Learner trait - unified solver surface for the episode runner
///
/// # Design Philosophy
///
/// This trait represents a **port** in hexagonal architecture - a boundary
/// between the episode loop and the concrete solvers. Each solver is an
/// **adapter** that implements this port.
///
/// # Call Sequence
///
/// For every step of a training episode the runner calls
/// `select_action` (or uses the action returned by the previous `update`),
/// steps the environment, then calls `update` with the transition. After the
/// terminal step it calls `end_episode`.
///
/// # Examples
///
/// ```no_run
/// use gridmdp::{ports::Learner, types::ActionMask};
///
/// fn first_move<L: Learner>(learner: &mut L) -> gridmdp::Result<gridmdp::types::Action> {
///     learner.select_action(0, ActionMask::ALL)
/// }
/// ```
pub trait Learner: Send {
    /// Pick an action for training (exploration allowed).
    ///
    /// An empty mask is treated as "every action allowed".
    fn select_action(&mut self, state: StateId, valid: ActionMask) -> Result<Action>;

    /// Pick the best action without exploring.
    ///
    /// Ties resolve to the lowest action index so greedy rollouts are
    /// deterministic.
    fn greedy_action(&self, state: StateId, valid: ActionMask) -> Action;

    /// Learn from one transition.
    ///
    /// On-policy learners return the action they committed to for
    /// `next_state`; the runner must take exactly that action next.
    ///
    /// # Default Implementation
    ///
    /// Does nothing and returns `Ok(None)`, suitable for fixed policies.
    fn update(&mut self, _transition: &Transition) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Called once after every training episode (epsilon decay).
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn end_episode(&mut self) {}

    /// Get the learner's name.
    ///
    /// Used for identification in summaries and logging.
    fn name(&self) -> &str;

    /// The greedy policy, one entry per state. `masks[s]` holds the valid
    /// actions of state `s`; the policy never picks outside it.
    fn policy(&self, masks: &[ActionMask]) -> Policy;

    /// State values, one entry per state (max over valid actions for TD learners).
    fn value_table(&self, masks: &[ActionMask]) -> ValueTable;

    /// Current exploration rate, if the learner explores.
    ///
    /// # Default Implementation
    ///
    /// Returns `None`.
    fn epsilon(&self) -> Option<f64> {
        None
    }

    /// Reset learner state to initial conditions.
    ///
    /// # Default Implementation
    ///
    /// Does nothing, suitable for stateless learners.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Seed the learner's internal random number generator.
    ///
    /// Training pipelines call this method when supplied with a deterministic
    /// seed to ensure reproducible results. Stateless learners can ignore it.
    ///
    /// # Default Implementation
    ///
    /// Does nothing and returns `Ok(())`.
    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }

    /// Enable downcasting to concrete types.
    ///
    /// This method allows accessing concrete learner implementations
    /// when needed (e.g., for serialization).
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Resolve an empty mask to "all actions".
pub(crate) fn effective_mask(valid: ActionMask) -> ActionMask {
    if valid.is_empty() {
        ActionMask::ALL
    } else {
        valid
    }
}
