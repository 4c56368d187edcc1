//! The transition engine: one environment step at a time.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    config::{EnvConfig, HazardRule},
    history::LoopDetector,
    objectives::{Milestone, Objectives},
    slip::SlipDistribution,
    state::{Flags, StateSpace},
};
use crate::{
    Error, Result,
    adversary::{AdversaryController, AdversaryMove, AdversaryView},
    grid::{CellType, Grid, Layout},
    types::{Action, ActionMask, Position, StateId},
};

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneKind {
    GoalReached,
    CaughtByAdversary,
    /// The powered agent caught the adversary
    AdversaryCaptured,
    Hazard,
    Timeout,
}

impl DoneKind {
    pub const ALL: [DoneKind; 5] = [
        DoneKind::GoalReached,
        DoneKind::CaughtByAdversary,
        DoneKind::AdversaryCaptured,
        DoneKind::Hazard,
        DoneKind::Timeout,
    ];

    /// Outcomes that count as the agent succeeding.
    pub fn is_success(self) -> bool {
        matches!(self, DoneKind::GoalReached | DoneKind::AdversaryCaptured)
    }
}

/// Something notable that happened during a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
    Slipped { intended: Action, actual: Action },
    WallBump,
    Teleported { from: Position, to: Position },
    Immobilized { turns_left: u32 },
    HazardEntered,
    PickupCollected { cell: CellType },
    BarrierUnlocked,
    PowerGranted { duration: u32 },
    AdversaryFrozen { turns: u32 },
    LoopDetected,
    GraceTurn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub position: Position,
    pub flags: Flags,
    pub adversary: Option<AdversaryMove>,
    pub events: Vec<StepEvent>,
}

/// Everything [`GridEnvironment::step`] reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub state: StateId,
    pub reward: f64,
    pub done: bool,
    pub done_kind: Option<DoneKind>,
    pub valid_actions: ActionMask,
    pub info: StepInfo,
}

/// A grid world with its live grid, agent, objective flags and adversary.
///
/// The pristine layout is kept so that [`GridEnvironment::reset`] can undo
/// every one-shot tile change.
#[derive(Debug, Clone)]
pub struct GridEnvironment {
    layout: Layout,
    config: EnvConfig,
    space: StateSpace,
    objectives: Objectives,
    grid: Grid,
    agent: Position,
    flags: Flags,
    steps: usize,
    immobilized: u32,
    power_timer: u32,
    loop_detector: Option<LoopDetector>,
    adversary: Option<AdversaryController>,
    rng: StdRng,
    done: bool,
}

impl GridEnvironment {
    /// Build an environment and put it in its initial state.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, the start is not walkable,
    /// pickup B has no pickup A to precede it, or an adversary is configured
    /// but the layout has no adversary start.
    pub fn new(layout: Layout, config: EnvConfig) -> Result<Self> {
        config.validate()?;
        if !layout.grid.is_walkable(layout.start) {
            return Err(Error::WallConflict {
                what: "agent start",
                position: layout.start,
            });
        }
        let objectives = Objectives::scan(&layout.grid);
        if objectives.pickup_b.is_some() && objectives.pickup_a.is_none() {
            return Err(Error::InvalidConfiguration {
                message: "pickup 'b' needs a pickup 'a' in the same layout".to_string(),
            });
        }
        let adversary = match &config.adversary {
            Some(adversary) => {
                let Some(start) = layout.adversary_start else {
                    return Err(Error::InvalidConfiguration {
                        message: "the layout has no adversary start".to_string(),
                    });
                };
                if !layout.grid.is_walkable(start) {
                    return Err(Error::WallConflict {
                        what: "adversary start",
                        position: start,
                    });
                }
                Some(AdversaryController::new(adversary.policy.clone(), start))
            }
            None => None,
        };

        let loop_detector = config
            .loop_guard
            .map(|guard| LoopDetector::new(guard.window, guard.threshold));

        Ok(Self {
            space: StateSpace::for_grid(&layout.grid),
            objectives,
            grid: layout.grid.clone(),
            agent: layout.start,
            flags: Flags::default(),
            steps: 0,
            immobilized: 0,
            power_timer: 0,
            loop_detector,
            adversary,
            rng: StdRng::from_rng(&mut rand::rng()),
            done: false,
            layout,
            config,
        })
    }

    /// Seed the slip random number generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed(seed);
        self
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Restore the pristine grid and start positions.
    pub fn reset(&mut self) -> (StateId, ActionMask) {
        self.grid = self.layout.grid.clone();
        self.agent = self.layout.start;
        self.flags = Flags::default();
        self.steps = 0;
        self.immobilized = 0;
        self.power_timer = 0;
        self.done = false;
        if let Some(detector) = self.loop_detector.as_mut() {
            detector.clear();
        }
        if let Some(adversary) = self.adversary.as_mut() {
            adversary.reset();
        }
        (self.state(), self.grid.valid_actions(self.agent))
    }

    /// Valid-action mask for an encoded state. Walls never move, so the
    /// answer does not depend on the live episode.
    pub fn valid_actions(&self, state: StateId) -> Result<ActionMask> {
        let (pos, _) = self.space.decode(state)?;
        Ok(self.layout.grid.valid_actions(pos))
    }

    pub fn state(&self) -> StateId {
        self.space.encode(self.agent, self.flags)
    }

    pub fn state_space(&self) -> &StateSpace {
        &self.space
    }

    pub fn state_count(&self) -> usize {
        self.space.state_count()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn objectives(&self) -> &Objectives {
        &self.objectives
    }

    /// The live grid, including consumed tiles.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent_position(&self) -> Position {
        self.agent
    }

    pub fn adversary_position(&self) -> Option<Position> {
        self.adversary.as_ref().map(AdversaryController::position)
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_powered(&self) -> bool {
        self.power_timer > 0
    }

    /// Advance one step.
    ///
    /// Order within a step: timeout, immobilization, slip redraw, movement
    /// and teleport, collision, tile effects, shaping, loop penalty,
    /// adversary move, collision. Terminal outcomes replace the step reward
    /// with the configured terminal magnitude.
    ///
    /// # Errors
    ///
    /// [`Error::EpisodeFinished`] if called after a terminal step without a reset.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome> {
        if self.done {
            return Err(Error::EpisodeFinished);
        }
        self.steps += 1;
        let mut events = Vec::new();
        let rewards = self.config.rewards;

        if self.steps >= self.config.max_steps {
            return Ok(self.finish(DoneKind::Timeout, rewards.timeout, None, events));
        }

        if self.immobilized > 0 {
            self.immobilized -= 1;
            events.push(StepEvent::Immobilized {
                turns_left: self.immobilized,
            });
            return Ok(self.close_step(rewards.move_cost, false, events));
        }

        let actual = self.slip(action);
        if actual != action {
            events.push(StepEvent::Slipped {
                intended: action,
                actual,
            });
        }

        let from = self.agent;
        let target = from.step(actual);
        if !self.grid.is_walkable(target) {
            events.push(StepEvent::WallBump);
            return Ok(self.close_step(rewards.wall_bump, false, events));
        }

        let start_flags = self.flags;
        let sub_goal = self.sub_goal(start_flags);
        let final_phase = self.objectives.final_phase(start_flags);

        let landed = self.grid.warp(target);
        if landed != target {
            events.push(StepEvent::Teleported {
                from: target,
                to: landed,
            });
        }
        self.agent = landed;

        if self.adversary_position() == Some(self.agent) {
            let (kind, reward) = self.collision();
            return Ok(self.finish(kind, reward, None, events));
        }

        let mut reward = rewards.move_cost;
        let mut collected = false;
        let cell = self.grid.cell_type(self.agent);

        if cell == CellType::Hazard {
            match self.config.hazard {
                HazardRule::Terminal => {
                    events.push(StepEvent::HazardEntered);
                    return Ok(self.finish(DoneKind::Hazard, rewards.hazard, None, events));
                }
                HazardRule::Immobilize { turns } => {
                    events.push(StepEvent::HazardEntered);
                    self.immobilized = turns;
                    reward += rewards.hazard;
                }
            }
        }

        match self.objectives.enter(cell, self.flags) {
            Some(Milestone::Pickup(cell)) => {
                self.flags.insert(Milestone::Pickup(cell).bit());
                self.grid.consume(self.agent);
                reward += rewards.pickup;
                collected = true;
                events.push(StepEvent::PickupCollected { cell });
            }
            Some(Milestone::Unlock) => {
                self.flags.insert(Flags::UNLOCKED);
                self.grid.reveal_goal();
                reward += rewards.unlock;
                events.push(StepEvent::BarrierUnlocked);
            }
            None => {}
        }

        if cell == CellType::GoalOpen && self.objectives.goal_open(self.flags) {
            return Ok(self.finish(DoneKind::GoalReached, rewards.goal, None, events));
        }

        if cell == CellType::Freeze {
            let turns = self
                .config
                .adversary
                .as_ref()
                .map_or(0, |adversary| adversary.freeze_turns);
            if let Some(adversary) = self.adversary.as_mut() {
                adversary.freeze(turns);
            }
            self.grid.consume(self.agent);
            reward += rewards.freeze;
            events.push(StepEvent::AdversaryFrozen { turns });
        }

        if collected && self.objectives.all_collected(self.flags) {
            if let Some(power) = self.config.power {
                self.power_timer = power.duration;
                events.push(StepEvent::PowerGranted {
                    duration: power.duration,
                });
            }
        }

        if let Some(goal) = sub_goal {
            reward += self.shaping(from, goal, final_phase);
        }

        if let Some(detector) = self.loop_detector.as_mut() {
            let guard = self.config.loop_guard;
            let exempt = guard.is_some_and(|g| g.exempt_final_phase)
                && self.objectives.final_phase(self.flags);
            if detector.record(self.agent) && !exempt {
                reward += rewards.loop_penalty;
                events.push(StepEvent::LoopDetected);
            }
        }

        let grace = collected
            && self
                .config
                .adversary
                .as_ref()
                .is_some_and(|adversary| adversary.grace_on_pickup);
        Ok(self.close_step(reward, grace, events))
    }

    /// Redraw the action on a slip tile.
    fn slip(&mut self, action: Action) -> Action {
        if self.grid.cell_type(self.agent) != CellType::Slip {
            return action;
        }
        if self.rng.random::<f64>() >= self.config.slip_probability {
            return action;
        }
        SlipDistribution::for_cell(&self.grid, self.agent)
            .sample(&mut self.rng)
            .unwrap_or(action)
    }

    /// The sub-goal shaping steers toward. Without a goal tile a powered
    /// layout hunts the adversary.
    fn sub_goal(&self, flags: Flags) -> Option<Position> {
        let hunt = self.config.power.and_then(|_| self.adversary_position());
        self.objectives.sub_goal(flags).or(hunt)
    }

    fn shaping(&self, from: Position, goal: Position, final_phase: bool) -> f64 {
        let shaping = &self.config.shaping;
        let before = from.manhattan(goal);
        let after = self.agent.manhattan(goal);
        if after < before {
            if final_phase {
                shaping.final_approach_bonus
            } else {
                shaping.approach_bonus
            }
        } else if after > before {
            -shaping.retreat_penalty
        } else {
            0.0
        }
    }

    fn collision(&self) -> (DoneKind, f64) {
        let rewards = &self.config.rewards;
        if self.is_powered() {
            (DoneKind::AdversaryCaptured, rewards.adversary_defeat)
        } else {
            (DoneKind::CaughtByAdversary, rewards.adversary_catch)
        }
    }

    /// Move the adversary (unless `grace`), check for a collision and tick
    /// the power timer.
    fn close_step(&mut self, reward: f64, grace: bool, mut events: Vec<StepEvent>) -> StepOutcome {
        let mut adversary_move = None;
        if grace && self.adversary.is_some() {
            events.push(StepEvent::GraceTurn);
        } else if let Some(adversary) = self.adversary.as_mut() {
            let view = AdversaryView {
                agent: self.agent,
                powered: self.power_timer > 0,
                goal: self.grid.goal_position(),
            };
            let moved = adversary.advance(&self.grid, &view);
            adversary_move = Some(moved);
            // a step that passes through the agent before a teleporter warp still collides
            if moved.to == self.agent || moved.stepped == self.agent {
                let (kind, reward) = self.collision();
                return self.finish(kind, reward, adversary_move, events);
            }
        }

        self.power_timer = self.power_timer.saturating_sub(1);
        trace!(state = self.state(), reward, "step");
        StepOutcome {
            state: self.state(),
            reward,
            done: false,
            done_kind: None,
            valid_actions: self.grid.valid_actions(self.agent),
            info: self.info(adversary_move, events),
        }
    }

    fn finish(
        &mut self,
        kind: DoneKind,
        reward: f64,
        adversary_move: Option<AdversaryMove>,
        events: Vec<StepEvent>,
    ) -> StepOutcome {
        self.done = true;
        debug!(?kind, steps = self.steps, position = %self.agent, "episode finished");
        StepOutcome {
            state: self.state(),
            reward,
            done: true,
            done_kind: Some(kind),
            valid_actions: self.grid.valid_actions(self.agent),
            info: self.info(adversary_move, events),
        }
    }

    fn info(&self, adversary_move: Option<AdversaryMove>, events: Vec<StepEvent>) -> StepInfo {
        StepInfo {
            position: self.agent,
            flags: self.flags,
            adversary: adversary_move,
            events,
        }
    }
}
