//! Q-learning and SARSA temporal difference learning
//!
//! This module implements temporal difference (TD) learning over sampled
//! environment transitions. TD methods bootstrap value estimates from
//! successor states.
//!
//! ## Algorithms
//!
//! - **Q-learning**: Off-policy TD control that learns optimal Q* values
//! - **SARSA**: On-policy TD control that learns Q^π for the followed policy
//!
//! ## Key Differences
//!
//! | Aspect | Q-learning | SARSA |
//! |--------|------------|-------|
//! | Policy | Off-policy (learns Q*) | On-policy (learns Q^π) |
//! | Update | Uses max_a Q(s',a') | Uses the a' actually taken next |
//! | Exploration | Can be reckless | More conservative |
//!
//! Both explore ε-greedily, breaking ties among maximal actions uniformly
//! at random, and decay ε once per episode.
//!
//! ## Usage Example
//!
//! ```no_run
//! use gridmdp::{SolverConfig, q_learning::{QLearningAgent, SarsaAgent}};
//!
//! let config = SolverConfig::new()
//!     .with_learning_rate(0.1)
//!     .with_discount(0.9)
//!     .with_epsilon(0.2, 0.995, 0.01);
//!
//! let q_agent = QLearningAgent::new(&config).unwrap();
//! let sarsa_agent = SarsaAgent::new(&config).unwrap().with_seed(42);
//! ```

pub mod agent;
pub mod q_table;
pub mod serialization;

// Public re-exports
pub use agent::{QLearningAgent, SarsaAgent};
pub use q_table::QTable;
pub use serialization::{SavedTdAgent, TdAlgorithm, TdLearner, TrainingMetadata};
