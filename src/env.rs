//! The grid-world environment: configuration, state encoding, the step
//! engine, and the enumerated model used by planning solvers.

pub mod config;
pub mod engine;
pub mod history;
pub mod model;
pub mod objectives;
pub mod scenario;
pub mod slip;
pub mod state;

pub use config::{
    AdversaryConfig, EnvConfig, HazardRule, LoopGuard, PowerConfig, RewardTable, ShapingConfig,
};
pub use engine::{DoneKind, GridEnvironment, StepEvent, StepInfo, StepOutcome};
pub use model::{Outcome, TransitionModel};
pub use objectives::{Milestone, Objectives};
pub use scenario::Scenario;
pub use slip::SlipDistribution;
pub use state::{Flags, StateSpace};
