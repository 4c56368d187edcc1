//! Named scenarios: a layout plus the reward table and rules that go with it.

use std::{fmt, str::FromStr};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{
    config::{
        AdversaryConfig, EnvConfig, HazardRule, LoopGuard, PowerConfig, RewardTable, ShapingConfig,
    },
    engine::GridEnvironment,
};
use crate::{
    Error, Result,
    adversary::{AdversaryPolicy, InterceptWeights},
    grid::{Layout, presets},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// 10x10 field without obstacles
    OpenField,
    /// Key, vault and exit guarded by a patrol
    EscapeRoom,
    /// Race to the goal against an interceptor, with freeze tiles
    FreezeChase,
    /// Generated lava field with slip tiles
    LavaField,
    /// Maze with two pickups that power the agent up against a chaser
    PelletPursuit,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::OpenField,
        Scenario::EscapeRoom,
        Scenario::FreezeChase,
        Scenario::LavaField,
        Scenario::PelletPursuit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::OpenField => "open-field",
            Scenario::EscapeRoom => "escape-room",
            Scenario::FreezeChase => "freeze-chase",
            Scenario::LavaField => "lava-field",
            Scenario::PelletPursuit => "pellet-pursuit",
        }
    }

    /// The scenario's layout. Only the lava field uses `rng`.
    pub fn layout(self, rng: &mut StdRng) -> Result<Layout> {
        match self {
            Scenario::OpenField => presets::open_field(),
            Scenario::EscapeRoom => presets::escape_room(),
            Scenario::FreezeChase => presets::freeze_chase(),
            Scenario::LavaField => presets::lava_field(rng),
            Scenario::PelletPursuit => presets::pellet_pursuit(),
        }
    }

    pub fn config(self) -> EnvConfig {
        match self {
            Scenario::OpenField => EnvConfig::new(300).with_rewards(RewardTable {
                move_cost: -1.0,
                wall_bump: -1.0,
                goal: 100.0,
                timeout: -200.0,
                ..RewardTable::default()
            }),
            Scenario::EscapeRoom => EnvConfig::new(300)
                .with_rewards(RewardTable {
                    move_cost: -1.0,
                    wall_bump: -10.0,
                    hazard: -5.0,
                    pickup: 200.0,
                    unlock: 300.0,
                    goal: 1000.0,
                    timeout: -200.0,
                    adversary_catch: -100.0,
                    adversary_defeat: 0.0,
                    freeze: 0.0,
                    loop_penalty: -20.0,
                })
                .with_hazard(HazardRule::Immobilize { turns: 3 })
                .with_shaping(ShapingConfig {
                    approach_bonus: 0.5,
                    retreat_penalty: 0.0,
                    final_approach_bonus: 1.0,
                })
                .with_loop_guard(LoopGuard {
                    window: 8,
                    threshold: 3,
                    exempt_final_phase: false,
                })
                .with_adversary(AdversaryConfig::new(AdversaryPolicy::Patrol {
                    waypoints: presets::ESCAPE_ROOM_PATROL.to_vec(),
                    wait_turns: 2,
                })),
            Scenario::FreezeChase => EnvConfig::new(100)
                .with_rewards(RewardTable {
                    move_cost: 0.0,
                    wall_bump: -1.0,
                    hazard: 0.0,
                    pickup: 0.0,
                    unlock: 0.0,
                    goal: 250.0,
                    timeout: -160.0,
                    adversary_catch: -80.0,
                    adversary_defeat: 0.0,
                    freeze: 5.0,
                    loop_penalty: 0.0,
                })
                .with_shaping(ShapingConfig {
                    approach_bonus: 0.3,
                    retreat_penalty: 0.2,
                    final_approach_bonus: 0.3,
                })
                .with_adversary(
                    AdversaryConfig::new(AdversaryPolicy::Interceptor {
                        weights: InterceptWeights::default(),
                    })
                    .with_freeze_turns(4),
                ),
            Scenario::LavaField => EnvConfig::new(300)
                .with_rewards(RewardTable {
                    move_cost: 0.0,
                    wall_bump: 0.0,
                    hazard: -500.0,
                    pickup: 0.0,
                    unlock: 0.0,
                    goal: 1000.0,
                    timeout: 0.0,
                    adversary_catch: 0.0,
                    adversary_defeat: 0.0,
                    freeze: 0.0,
                    loop_penalty: 0.0,
                })
                .with_hazard(HazardRule::Terminal),
            Scenario::PelletPursuit => EnvConfig::new(500)
                .with_rewards(RewardTable {
                    move_cost: -1.0,
                    wall_bump: -10.0,
                    hazard: 0.0,
                    pickup: 200.0,
                    unlock: 0.0,
                    goal: 0.0,
                    timeout: -200.0,
                    adversary_catch: -500.0,
                    adversary_defeat: 15000.0,
                    freeze: 0.0,
                    loop_penalty: -10.0,
                })
                .with_shaping(ShapingConfig {
                    approach_bonus: 1.0,
                    retreat_penalty: 0.5,
                    final_approach_bonus: 2.0,
                })
                .with_loop_guard(LoopGuard {
                    window: 15,
                    threshold: 3,
                    exempt_final_phase: true,
                })
                .with_power(PowerConfig { duration: 25 })
                .with_adversary(
                    AdversaryConfig::new(AdversaryPolicy::Pursuit { flee_every: 3 })
                        .with_grace_on_pickup(true),
                ),
        }
    }

    /// Build a ready environment. A seed fixes both the generated layout and
    /// the slip draws.
    pub fn build(self, seed: Option<u64>) -> Result<GridEnvironment> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let layout = self.layout(&mut rng)?;
        let env = GridEnvironment::new(layout, self.config())?;
        Ok(match seed {
            Some(seed) => env.with_seed(seed),
            None => env,
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| Error::InvalidConfiguration {
                message: format!("unknown scenario '{s}'"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scenario_builds() {
        for scenario in Scenario::ALL {
            let mut env = scenario.build(Some(11)).unwrap();
            let (_, mask) = env.reset();
            assert!(!mask.is_empty(), "{scenario} starts boxed in");
        }
    }

    #[test]
    fn test_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
        }
        assert!("maze".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_state_spaces_follow_objectives() {
        let states = |scenario: Scenario| scenario.build(Some(0)).unwrap().state_count();
        assert_eq!(states(Scenario::OpenField), 100);
        // key and vault: three flag bits
        assert_eq!(states(Scenario::EscapeRoom), 800);
        assert_eq!(states(Scenario::PelletPursuit), 400);
    }
}
