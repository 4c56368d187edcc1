//! Enumerated transition model for model-based solvers.

use tracing::debug;

use super::{
    config::{EnvConfig, HazardRule},
    engine::GridEnvironment,
    objectives::{Milestone, Objectives},
    state::{Flags, StateSpace},
};
use crate::{
    Result,
    grid::{CellType, Grid},
    types::{Action, ActionMask, Position, StateId, constants::ACTION_COUNT},
};

/// One possible result of taking an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub probability: f64,
    pub next_state: StateId,
    pub reward: f64,
    pub terminal: bool,
}

/// Full `P(s', r | s, a)` table over every encoded state.
///
/// Built from the pristine layout with objective progress read from the
/// flag bits. Slip tiles move uniformly over their valid directions whatever
/// the chosen action. The adversary, the loop penalty and the timeout are
/// not part of the model.
#[derive(Debug, Clone)]
pub struct TransitionModel {
    space: StateSpace,
    terminal: Vec<bool>,
    valid: Vec<ActionMask>,
    outcomes: Vec<[Vec<Outcome>; ACTION_COUNT]>,
}

struct ModelBuilder<'a> {
    grid: &'a Grid,
    config: &'a EnvConfig,
    objectives: Objectives,
    space: StateSpace,
}

impl ModelBuilder<'_> {
    fn is_terminal(&self, pos: Position, flags: Flags) -> bool {
        if !self.grid.is_walkable(pos) {
            return true;
        }
        let hazard_kills = self.grid.cell_type(pos) == CellType::Hazard
            && self.config.hazard == HazardRule::Terminal;
        let at_goal = self.objectives.goal == Some(pos) && self.objectives.goal_open(flags);
        hazard_kills || at_goal
    }

    fn transition(&self, from: Position, flags: Flags, direction: Action) -> (StateId, f64, bool) {
        let rewards = &self.config.rewards;
        let target = from.step(direction);
        if !self.grid.is_walkable(target) {
            return (self.space.encode(from, flags), rewards.wall_bump, false);
        }
        let landed = self.grid.warp(target);
        let cell = self.grid.cell_type(landed);
        let mut next_flags = flags;
        let mut reward = rewards.move_cost;

        if cell == CellType::Hazard {
            match self.config.hazard {
                HazardRule::Terminal => {
                    return (self.space.encode(landed, flags), rewards.hazard, true);
                }
                HazardRule::Immobilize { .. } => reward += rewards.hazard,
            }
        }
        match self.objectives.enter(cell, flags) {
            Some(milestone @ Milestone::Pickup(_)) => {
                next_flags.insert(milestone.bit());
                reward += rewards.pickup;
            }
            Some(Milestone::Unlock) => {
                next_flags.insert(Flags::UNLOCKED);
                reward += rewards.unlock;
            }
            None => {}
        }
        let next_state = self.space.encode(landed, next_flags);
        if self.objectives.goal == Some(landed) && self.objectives.goal_open(next_flags) {
            return (next_state, rewards.goal, true);
        }

        if let Some(goal) = self.objectives.sub_goal(flags) {
            let shaping = &self.config.shaping;
            let before = from.manhattan(goal);
            let after = landed.manhattan(goal);
            if after < before {
                reward += if self.objectives.final_phase(flags) {
                    shaping.final_approach_bonus
                } else {
                    shaping.approach_bonus
                };
            } else if after > before {
                reward -= shaping.retreat_penalty;
            }
        }
        (next_state, reward, false)
    }

    fn outcomes(&self, pos: Position, flags: Flags, action: Action) -> Vec<Outcome> {
        let directions: Vec<(Action, f64)> = if self.grid.cell_type(pos) == CellType::Slip {
            let valid = self.grid.valid_actions(pos).actions();
            let p = 1.0 / valid.len().max(1) as f64;
            valid.into_iter().map(|direction| (direction, p)).collect()
        } else {
            vec![(action, 1.0)]
        };
        if directions.is_empty() {
            // enclosed slip tile: the move bumps
            let (next_state, reward, terminal) = self.transition(pos, flags, action);
            return vec![Outcome {
                probability: 1.0,
                next_state,
                reward,
                terminal,
            }];
        }
        directions
            .into_iter()
            .map(|(direction, probability)| {
                let (next_state, reward, terminal) = self.transition(pos, flags, direction);
                Outcome {
                    probability,
                    next_state,
                    reward,
                    terminal,
                }
            })
            .collect()
    }
}

impl TransitionModel {
    /// Enumerate the model of `env`'s layout and configuration.
    pub fn from_env(env: &GridEnvironment) -> Result<Self> {
        Self::build(&env.layout().grid, env.config())
    }

    pub fn build(grid: &Grid, config: &EnvConfig) -> Result<Self> {
        config.validate()?;
        let builder = ModelBuilder {
            grid,
            config,
            objectives: Objectives::scan(grid),
            space: StateSpace::for_grid(grid),
        };
        let space = builder.space;
        let count = space.state_count();
        let mut terminal = Vec::with_capacity(count);
        let mut valid = Vec::with_capacity(count);
        let mut outcomes = Vec::with_capacity(count);

        for state in 0..count {
            let (pos, flags) = space.decode(state)?;
            let is_terminal = builder.is_terminal(pos, flags);
            terminal.push(is_terminal);
            if is_terminal {
                valid.push(ActionMask::default());
                outcomes.push(Default::default());
                continue;
            }
            valid.push(grid.valid_actions(pos));
            outcomes.push(Action::ALL.map(|action| builder.outcomes(pos, flags, action)));
        }

        debug!(
            states = count,
            terminal = terminal.iter().filter(|&&t| t).count(),
            "built transition model"
        );
        Ok(Self {
            space,
            terminal,
            valid,
            outcomes,
        })
    }

    pub fn state_count(&self) -> usize {
        self.terminal.len()
    }

    pub fn state_space(&self) -> &StateSpace {
        &self.space
    }

    /// Walls, goal states and lethal hazards. Their value stays 0.
    pub fn is_terminal(&self, state: StateId) -> bool {
        self.terminal[state]
    }

    pub fn valid_actions(&self, state: StateId) -> ActionMask {
        self.valid[state]
    }

    pub fn outcomes(&self, state: StateId, action: Action) -> &[Outcome] {
        &self.outcomes[state][action.index()]
    }

    /// `E[r + gamma * V(s')]` for one state-action pair.
    pub fn action_value(&self, state: StateId, action: Action, values: &[f64], gamma: f64) -> f64 {
        self.outcomes(state, action)
            .iter()
            .map(|o| {
                let future = if o.terminal {
                    0.0
                } else {
                    values[o.next_state]
                };
                o.probability * (o.reward + gamma * future)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::RewardTable, grid::Layout};

    #[test]
    fn test_deterministic_moves_and_terminal_goal() {
        let layout = Layout::open_field(3, Position::new(0, 0), Position::new(2, 2)).unwrap();
        let model = TransitionModel::build(&layout.grid, &EnvConfig::default()).unwrap();
        assert_eq!(model.state_count(), 9);
        assert!(model.is_terminal(8));
        let right = model.outcomes(0, Action::Right);
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].next_state, 1);
        assert_eq!(right[0].reward, -1.0);

        let into_goal = model.outcomes(5, Action::Down);
        assert_eq!(into_goal[0].next_state, 8);
        assert!(into_goal[0].terminal);
        assert_eq!(into_goal[0].reward, 100.0);
    }

    #[test]
    fn test_slip_cells_spread_uniformly_over_valid_directions() {
        let layout = Layout::parse(
            "
            S..
            H~.
            ..G
            ",
        )
        .unwrap();
        let rewards = RewardTable {
            hazard: -50.0,
            ..RewardTable::default()
        };
        let config = EnvConfig::default()
            .with_rewards(rewards)
            .with_hazard(HazardRule::Terminal);
        let model = TransitionModel::build(&layout.grid, &config).unwrap();
        let slip = 4;
        for action in Action::ALL {
            let outcomes = model.outcomes(slip, action);
            assert_eq!(outcomes.len(), 4);
            let total: f64 = outcomes.iter().map(|o| o.probability).sum();
            assert!((total - 1.0).abs() < 1e-12);
            assert!(outcomes.iter().any(|o| o.terminal && o.reward == -50.0));
        }
        assert!(model.is_terminal(3));
    }

    #[test]
    fn test_pickup_moves_into_the_flagged_layer() {
        let layout = Layout::parse(
            "
            Sa.
            ...
            ..G
            ",
        )
        .unwrap();
        let model = TransitionModel::build(&layout.grid, &EnvConfig::default()).unwrap();
        assert_eq!(model.state_count(), 18);
        let pickup = model.outcomes(0, Action::Right)[0];
        assert_eq!(pickup.next_state, 1 + 9);
        // the goal is open without a barrier in both layers
        assert!(model.is_terminal(8));
        assert!(model.is_terminal(17));
    }
}
