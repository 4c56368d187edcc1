//! One episode of interaction between a learner and an environment

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Result,
    env::{DoneKind, GridEnvironment, StepEvent},
    ports::{Learner, Transition},
    types::{Action, Position, StateId},
};

/// Whether the runner lets the learner explore and learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// ε-greedy actions and an update after every step
    Train,
    /// First-max greedy actions, no learning
    Greedy,
}

/// One environment step as seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub episode: usize,
    pub step: usize,
    pub state: StateId,
    pub action: Action,
    pub reward: f64,
    pub next_state: StateId,
    pub done: bool,
    pub done_kind: Option<DoneKind>,
    pub position: Position,
    pub adversary: Option<Position>,
    pub events: Vec<StepEvent>,
}

/// Ordered `(state, action)` pairs of one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeTrace {
    steps: Vec<(StateId, Action)>,
}

impl EpisodeTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: StateId, action: Action) {
        self.steps.push((state, action));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[(StateId, Action)] {
        &self.steps
    }

    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.steps.iter().map(|&(_, action)| action)
    }
}

/// Outcome of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    /// `None` when the runner's step limit cut the episode short
    pub done_kind: Option<DoneKind>,
    /// Exploration rate the episode was played with
    pub epsilon: Option<f64>,
    pub trace: EpisodeTrace,
}

impl EpisodeSummary {
    pub fn reached_goal(&self) -> bool {
        self.done_kind == Some(DoneKind::GoalReached)
    }

    /// Goal reached or adversary captured.
    pub fn succeeded(&self) -> bool {
        self.done_kind.is_some_and(DoneKind::is_success)
    }
}

/// Drives a learner through the environment until a terminal step.
///
/// In [`RunMode::Train`] the action an on-policy learner returns from
/// [`Learner::update`] is replayed as the next step's action.
///
/// # Examples
///
/// ```no_run
/// use gridmdp::{
///     SolverConfig,
///     env::Scenario,
///     pipeline::EpisodeRunner,
///     q_learning::QLearningAgent,
/// };
///
/// let mut env = Scenario::OpenField.build(Some(1)).unwrap();
/// let mut agent = QLearningAgent::new(&SolverConfig::new()).unwrap();
/// let summary = EpisodeRunner::training().run(&mut env, &mut agent, 0, |_| Ok(())).unwrap();
/// println!("{} steps, return {}", summary.steps, summary.total_reward);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRunner {
    mode: RunMode,
    step_limit: Option<usize>,
}

impl EpisodeRunner {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            step_limit: None,
        }
    }

    pub fn training() -> Self {
        Self::new(RunMode::Train)
    }

    pub fn greedy() -> Self {
        Self::new(RunMode::Greedy)
    }

    /// Stop after `limit` steps even if the environment has not finished.
    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Run one episode from a fresh reset, calling `on_step` after every step.
    pub fn run<L, F>(
        &self,
        env: &mut GridEnvironment,
        learner: &mut L,
        episode: usize,
        mut on_step: F,
    ) -> Result<EpisodeSummary>
    where
        L: Learner + ?Sized,
        F: FnMut(&StepRecord) -> Result<()>,
    {
        let epsilon = match self.mode {
            RunMode::Train => learner.epsilon(),
            RunMode::Greedy => None,
        };
        let (mut state, mut valid) = env.reset();
        let mut trace = EpisodeTrace::new();
        let mut total_reward = 0.0;
        let mut done_kind = None;
        let mut pending: Option<Action> = None;

        while self.step_limit.is_none_or(|limit| trace.len() < limit) {
            let action = match self.mode {
                RunMode::Greedy => learner.greedy_action(state, valid),
                RunMode::Train => match pending.take() {
                    Some(action) => action,
                    None => learner.select_action(state, valid)?,
                },
            };
            let outcome = env.step(action)?;

            if self.mode == RunMode::Train {
                pending = learner.update(&Transition {
                    state,
                    action,
                    reward: outcome.reward,
                    next_state: outcome.state,
                    done: outcome.done,
                    next_valid: outcome.valid_actions,
                })?;
            }

            trace.push(state, action);
            total_reward += outcome.reward;
            on_step(&StepRecord {
                episode,
                step: trace.len() - 1,
                state,
                action,
                reward: outcome.reward,
                next_state: outcome.state,
                done: outcome.done,
                done_kind: outcome.done_kind,
                position: outcome.info.position,
                adversary: outcome.info.adversary.map(|m| m.to),
                events: outcome.info.events,
            })?;

            if outcome.done {
                done_kind = outcome.done_kind;
                break;
            }
            state = outcome.state;
            valid = outcome.valid_actions;
        }

        if self.mode == RunMode::Train {
            learner.end_episode();
        }
        debug!(
            episode,
            steps = trace.len(),
            total_reward,
            ?done_kind,
            "episode finished"
        );
        Ok(EpisodeSummary {
            episode,
            steps: trace.len(),
            total_reward,
            done_kind,
            epsilon,
            trace,
        })
    }
}

/// Roll out the learner's greedy policy once, without learning.
pub fn run_best_policy<L: Learner + ?Sized>(
    env: &mut GridEnvironment,
    learner: &mut L,
) -> Result<EpisodeSummary> {
    EpisodeRunner::greedy().run(env, learner, 0, |_| Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        SolverConfig,
        dynamic_programming::PolicyFollower,
        env::EnvConfig,
        grid::Layout,
        policy::{Policy, ValueTable},
        q_learning::SarsaAgent,
    };

    fn corridor_env(max_steps: usize) -> GridEnvironment {
        let layout = Layout::open_field(3, Position::new(0, 0), Position::new(2, 0)).unwrap();
        GridEnvironment::new(layout, EnvConfig::new(max_steps)).unwrap()
    }

    fn always_right() -> PolicyFollower {
        PolicyFollower::new(
            "right",
            Policy::from_actions(vec![Some(Action::Right); 9]),
            ValueTable::zeros(9),
        )
    }

    #[test]
    fn test_greedy_rollout_records_trace() {
        let mut env = corridor_env(50);
        let mut learner = always_right();
        let summary = run_best_policy(&mut env, &mut learner).unwrap();
        assert!(summary.reached_goal());
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.total_reward, 99.0);
        let expected = [(0, Action::Right), (1, Action::Right)];
        assert_eq!(summary.trace.steps(), &expected);
    }

    #[test]
    fn test_step_hook_sees_every_step() {
        let mut env = corridor_env(50);
        let mut learner = always_right();
        let mut seen = Vec::new();
        EpisodeRunner::greedy()
            .run(&mut env, &mut learner, 4, |record| {
                seen.push((record.episode, record.step, record.done));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![(4, 0, false), (4, 1, true)]);
    }

    #[test]
    fn test_step_limit_cuts_episode() {
        let mut env = corridor_env(50);
        let policy = Policy::from_actions(vec![Some(Action::Down); 9]);
        let mut learner = PolicyFollower::new("down", policy, ValueTable::zeros(9));
        let summary = EpisodeRunner::greedy()
            .with_step_limit(Some(5))
            .run(&mut env, &mut learner, 0, |_| Ok(()))
            .unwrap();
        assert_eq!(summary.steps, 5);
        assert_eq!(summary.done_kind, None);
    }

    #[test]
    fn test_training_episodes_always_end_by_timeout() {
        let mut env = corridor_env(10);
        let config = SolverConfig::new().with_epsilon(1.0, 1.0, 1.0).with_seed(2);
        let mut agent = SarsaAgent::new(&config).unwrap();
        for episode in 0..20 {
            let summary = EpisodeRunner::training()
                .run(&mut env, &mut agent, episode, |_| Ok(()))
                .unwrap();
            assert!(summary.done_kind.is_some());
            assert!(summary.steps <= 10);
            assert_eq!(summary.epsilon, Some(1.0));
        }
        assert!(agent.q_table().size() > 0);
    }
}
