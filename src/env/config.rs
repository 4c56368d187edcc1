//! Environment configuration: reward magnitudes and optional rules.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, adversary::AdversaryPolicy, error::check_unit_interval};

/// Reward magnitude for every event the environment can emit.
///
/// Terminal events (goal, hazard death, catches, timeout) replace the step
/// reward instead of being added to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    /// Baseline cost of a step that moves (or stays immobilized)
    pub move_cost: f64,
    /// Penalty for an action that would leave the grid or enter a wall
    pub wall_bump: f64,
    pub hazard: f64,
    pub pickup: f64,
    pub unlock: f64,
    pub goal: f64,
    pub timeout: f64,
    pub adversary_catch: f64,
    /// Terminal reward for catching the adversary while powered
    pub adversary_defeat: f64,
    pub freeze: f64,
    pub loop_penalty: f64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            move_cost: -1.0,
            wall_bump: -1.0,
            hazard: -10.0,
            pickup: 0.0,
            unlock: 0.0,
            goal: 100.0,
            timeout: -200.0,
            adversary_catch: -100.0,
            adversary_defeat: 100.0,
            freeze: 0.0,
            loop_penalty: 0.0,
        }
    }
}

impl RewardTable {
    fn values(&self) -> [(&'static str, f64); 11] {
        [
            ("move_cost", self.move_cost),
            ("wall_bump", self.wall_bump),
            ("hazard", self.hazard),
            ("pickup", self.pickup),
            ("unlock", self.unlock),
            ("goal", self.goal),
            ("timeout", self.timeout),
            ("adversary_catch", self.adversary_catch),
            ("adversary_defeat", self.adversary_defeat),
            ("freeze", self.freeze),
            ("loop_penalty", self.loop_penalty),
        ]
    }
}

/// What entering a hazard tile does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum HazardRule {
    /// Pay the hazard penalty and lose the next `turns` movements.
    Immobilize { turns: u32 },
    /// End the episode with the hazard reward.
    Terminal,
}

impl Default for HazardRule {
    fn default() -> Self {
        HazardRule::Immobilize { turns: 3 }
    }
}

/// Dense shaping on the Manhattan distance to the current sub-goal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapingConfig {
    pub approach_bonus: f64,
    /// Subtracted when the distance grows
    pub retreat_penalty: f64,
    /// Replaces `approach_bonus` once the final sub-goal is active
    pub final_approach_bonus: f64,
}

/// Penalize positions that recur `threshold` times within the last `window` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopGuard {
    pub window: usize,
    pub threshold: usize,
    /// Skip the penalty once the final sub-goal is active
    pub exempt_final_phase: bool,
}

/// Time-limited power-up granted once every pickup has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerConfig {
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdversaryConfig {
    pub policy: AdversaryPolicy,
    /// Skip the adversary's move on the step the agent collects a pickup
    pub grace_on_pickup: bool,
    /// Turns the adversary stays frozen after the agent steps on a freeze tile
    pub freeze_turns: u32,
}

impl AdversaryConfig {
    pub fn new(policy: AdversaryPolicy) -> Self {
        Self {
            policy,
            grace_on_pickup: false,
            freeze_turns: 0,
        }
    }

    pub fn with_grace_on_pickup(mut self, grace: bool) -> Self {
        self.grace_on_pickup = grace;
        self
    }

    pub fn with_freeze_turns(mut self, turns: u32) -> Self {
        self.freeze_turns = turns;
        self
    }
}

/// Complete configuration of a [`super::GridEnvironment`].
///
/// # Examples
///
/// ```
/// use gridmdp::env::{EnvConfig, HazardRule, RewardTable};
///
/// let config = EnvConfig::new(300)
///     .with_rewards(RewardTable { goal: 1000.0, ..RewardTable::default() })
///     .with_hazard(HazardRule::Terminal);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Step budget per episode; the step that reaches it times out
    pub max_steps: usize,
    pub rewards: RewardTable,
    pub hazard: HazardRule,
    /// Chance that a slip tile redraws the action
    pub slip_probability: f64,
    pub shaping: ShapingConfig,
    pub loop_guard: Option<LoopGuard>,
    pub power: Option<PowerConfig>,
    pub adversary: Option<AdversaryConfig>,
}

impl EnvConfig {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            rewards: RewardTable::default(),
            hazard: HazardRule::default(),
            slip_probability: 1.0,
            shaping: ShapingConfig::default(),
            loop_guard: None,
            power: None,
            adversary: None,
        }
    }

    pub fn with_rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_hazard(mut self, hazard: HazardRule) -> Self {
        self.hazard = hazard;
        self
    }

    pub fn with_slip_probability(mut self, probability: f64) -> Self {
        self.slip_probability = probability;
        self
    }

    pub fn with_shaping(mut self, shaping: ShapingConfig) -> Self {
        self.shaping = shaping;
        self
    }

    pub fn with_loop_guard(mut self, guard: LoopGuard) -> Self {
        self.loop_guard = Some(guard);
        self
    }

    pub fn with_power(mut self, power: PowerConfig) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_adversary(mut self, adversary: AdversaryConfig) -> Self {
        self.adversary = Some(adversary);
        self
    }

    /// Reject configurations that would produce unbounded episodes or NaN rewards.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::InvalidConfiguration {
                message: "max_steps must be at least 1".to_string(),
            });
        }
        check_unit_interval("slip_probability", self.slip_probability)?;

        let shaping = [
            ("approach_bonus", self.shaping.approach_bonus),
            ("retreat_penalty", self.shaping.retreat_penalty),
            ("final_approach_bonus", self.shaping.final_approach_bonus),
        ];
        for (name, value) in self.rewards.values().into_iter().chain(shaping) {
            if !value.is_finite() {
                return Err(Error::ParameterOutOfRange {
                    name,
                    value,
                    range: "finite values",
                });
            }
        }

        if let Some(guard) = &self.loop_guard {
            if guard.window == 0 || guard.threshold == 0 {
                return Err(Error::InvalidConfiguration {
                    message: format!(
                        "loop guard needs a positive window and threshold, got {} and {}",
                        guard.window, guard.threshold
                    ),
                });
            }
        }
        if let Some(power) = &self.power {
            if power.duration == 0 {
                return Err(Error::InvalidConfiguration {
                    message: "power duration must be at least 1 step".to_string(),
                });
            }
        }
        if let Some(adversary) = &self.adversary {
            adversary.policy.validate()?;
        }
        Ok(())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EnvConfig::default().validate().is_ok());
    }

    #[test]
    fn test_slip_probability_outside_unit_interval_is_rejected() {
        let config = EnvConfig::default().with_slip_probability(1.5);
        assert!(matches!(
            config.validate(),
            Err(Error::ParameterOutOfRange {
                name: "slip_probability",
                ..
            })
        ));
        let config = EnvConfig::default().with_slip_probability(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_reward_is_rejected() {
        let rewards = RewardTable {
            goal: f64::INFINITY,
            ..RewardTable::default()
        };
        let config = EnvConfig::default().with_rewards(rewards);
        assert!(matches!(
            config.validate(),
            Err(Error::ParameterOutOfRange { name: "goal", .. })
        ));
    }

    #[test]
    fn test_zero_step_budget_and_empty_loop_window_are_rejected() {
        assert!(EnvConfig::new(0).validate().is_err());
        let config = EnvConfig::default().with_loop_guard(LoopGuard {
            window: 0,
            threshold: 3,
            exempt_final_phase: false,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hazard_rule_serializes_with_tag() {
        let json = serde_json::to_string(&HazardRule::Immobilize { turns: 3 }).unwrap();
        assert_eq!(json, r#"{"rule":"immobilize","turns":3}"#);
        let rule: HazardRule = serde_json::from_str(r#"{"rule":"terminal"}"#).unwrap();
        assert_eq!(rule, HazardRule::Terminal);
    }
}
