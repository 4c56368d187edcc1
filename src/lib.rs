//! Grid-world Markov decision processes with tabular solvers
//!
//! This crate provides:
//! - Square grid layouts with walls, hazards, slip tiles, keys, pickups and
//!   freeze tiles, parsed from text or generated with a guaranteed path
//! - A step engine with a rule-based adversary (chase, flee, patrol,
//!   intercept) and per-scenario reward tables
//! - Q-learning and SARSA agents with decaying ε-greedy exploration
//! - Value iteration and policy iteration over the enumerated model
//! - A training pipeline with pluggable observers and a CLI

pub mod adversary;
pub mod cli;
pub mod config;
pub mod dynamic_programming;
pub mod env;
pub mod error;
pub mod exploration;
pub mod grid;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod q_learning;
pub mod types;

pub use config::SolverConfig;
pub use error::{Error, Result};
