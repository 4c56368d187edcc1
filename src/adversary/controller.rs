use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{
    AdversaryPolicy, AdversaryState, Step,
    chase::{greedy_step, shortest_path_step},
    flee::flee_step,
    intercept::intercept_step,
    patrol::patrol_step,
};
use crate::{grid::Grid, types::Position};

/// What the adversary can see when it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdversaryView {
    pub agent: Position,
    pub powered: bool,
    pub goal: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdversaryMode {
    Patrol,
    Chase,
    Flee,
    Intercept,
    Frozen,
}

/// Result of one adversary turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdversaryMove {
    pub from: Position,
    /// Cell stepped onto before any teleporter warp
    pub stepped: Position,
    pub to: Position,
    pub mode: AdversaryMode,
}

impl AdversaryMove {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

/// Moves the adversary once per environment step.
#[derive(Debug, Clone)]
pub struct AdversaryController {
    policy: AdversaryPolicy,
    start: Position,
    state: AdversaryState,
}

impl AdversaryController {
    pub fn new(policy: AdversaryPolicy, start: Position) -> Self {
        Self {
            policy,
            start,
            state: AdversaryState::new(start),
        }
    }

    pub fn reset(&mut self) {
        self.state = AdversaryState::new(self.start);
    }

    pub fn state(&self) -> &AdversaryState {
        &self.state
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn policy(&self) -> &AdversaryPolicy {
        &self.policy
    }

    /// Freeze for `turns` turns. A longer existing freeze is kept.
    pub fn freeze(&mut self, turns: u32) {
        self.state.frozen = self.state.frozen.max(turns);
    }

    /// The rule the next call to [`Self::advance`] will use.
    pub fn mode(&self, view: &AdversaryView) -> AdversaryMode {
        if self.state.frozen > 0 {
            return AdversaryMode::Frozen;
        }
        match &self.policy {
            AdversaryPolicy::Patrol { .. } => AdversaryMode::Patrol,
            AdversaryPolicy::Pursuit { .. } if view.powered => AdversaryMode::Flee,
            AdversaryPolicy::Pursuit { .. } => AdversaryMode::Chase,
            AdversaryPolicy::Interceptor { .. } => AdversaryMode::Intercept,
        }
    }

    /// Take one turn. A turn without a legal move is a stall, not an error.
    pub fn advance(&mut self, grid: &Grid, view: &AdversaryView) -> AdversaryMove {
        let from = self.state.position;
        let mode = self.mode(view);

        let step = match (mode, &self.policy) {
            (AdversaryMode::Frozen, _) => {
                self.state.frozen -= 1;
                None
            }
            (
                _,
                AdversaryPolicy::Patrol {
                    waypoints,
                    wait_turns,
                },
            ) => patrol_step(grid, &mut self.state, waypoints, *wait_turns),
            (AdversaryMode::Flee, AdversaryPolicy::Pursuit { flee_every }) => {
                self.state.throttle = (self.state.throttle + 1) % (*flee_every).max(1);
                if self.state.throttle == 0 {
                    flee_step(grid, from, view.agent)
                } else {
                    None
                }
            }
            (_, AdversaryPolicy::Pursuit { .. }) => {
                self.state.throttle = 0;
                self.chase(grid, from, view.agent)
            }
            (_, AdversaryPolicy::Interceptor { weights }) => {
                intercept_step(grid, weights, from, view.agent, view.goal)
            }
        };

        let Step { stepped, landed } = step.unwrap_or(Step {
            stepped: from,
            landed: from,
        });
        self.state.position = landed;
        AdversaryMove {
            from,
            stepped,
            to: landed,
            mode,
        }
    }

    fn chase(&self, grid: &Grid, from: Position, target: Position) -> Option<Step> {
        if from == target {
            return None;
        }
        shortest_path_step(grid, from, target).or_else(|| {
            let fallback = greedy_step(grid, from, target);
            if fallback.is_none() {
                warn!(%from, %target, "adversary has no path to the agent and stalls");
            }
            fallback
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Layout;

    fn view(agent: Position, powered: bool) -> AdversaryView {
        AdversaryView {
            agent,
            powered,
            goal: None,
        }
    }

    #[test]
    fn test_chase_takes_the_vertical_step() {
        let layout = Layout::open_field(5, Position::new(4, 4), Position::new(4, 3)).unwrap();
        let policy = AdversaryPolicy::Pursuit { flee_every: 3 };
        let mut controller = AdversaryController::new(policy, Position::new(0, 0));
        let moved = controller.advance(&layout.grid, &view(Position::new(0, 3), false));
        assert_eq!(moved.mode, AdversaryMode::Chase);
        assert_eq!(moved.to, Position::new(0, 1));
    }

    #[test]
    fn test_flee_is_throttled_to_one_move_in_three() {
        let layout = Layout::open_field(7, Position::new(0, 0), Position::new(6, 6)).unwrap();
        let policy = AdversaryPolicy::Pursuit { flee_every: 3 };
        let mut controller = AdversaryController::new(policy, Position::new(3, 3));
        let agent = Position::new(0, 3);
        let moves: Vec<bool> = (0..6)
            .map(|_| controller.advance(&layout.grid, &view(agent, true)).moved())
            .collect();
        assert_eq!(moves, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_frozen_adversary_stays_then_resumes() {
        let layout = Layout::open_field(5, Position::new(4, 4), Position::new(4, 3)).unwrap();
        let policy = AdversaryPolicy::Pursuit { flee_every: 1 };
        let mut controller = AdversaryController::new(policy, Position::new(0, 0));
        controller.freeze(2);
        let agent = view(Position::new(0, 4), false);
        assert_eq!(
            controller.advance(&layout.grid, &agent).mode,
            AdversaryMode::Frozen
        );
        assert!(!controller.advance(&layout.grid, &agent).moved());
        assert!(controller.advance(&layout.grid, &agent).moved());
    }

    #[test]
    fn test_reset_restores_start() {
        let layout = Layout::open_field(5, Position::new(4, 4), Position::new(4, 3)).unwrap();
        let start = Position::new(0, 0);
        let policy = AdversaryPolicy::Pursuit { flee_every: 1 };
        let mut controller = AdversaryController::new(policy, start);
        controller.advance(&layout.grid, &view(Position::new(4, 4), false));
        assert_ne!(controller.position(), start);
        controller.reset();
        assert_eq!(controller.state(), &AdversaryState::new(start));
    }
}
