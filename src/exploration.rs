//! Epsilon schedule shared by the temporal-difference learners.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, error::check_unit_interval};

/// Multiplicative per-episode decay with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    initial: f64,
    current: f64,
    decay: f64,
    min: f64,
}

impl EpsilonSchedule {
    pub fn new(initial: f64, decay: f64, min: f64) -> Result<Self> {
        check_unit_interval("epsilon", initial)?;
        check_unit_interval("epsilon_decay", decay)?;
        check_unit_interval("min_epsilon", min)?;
        if min > initial {
            return Err(Error::InvalidConfiguration {
                message: format!("min_epsilon {min} exceeds initial epsilon {initial}"),
            });
        }
        Ok(Self {
            initial,
            current: initial,
            decay,
            min,
        })
    }

    pub fn value(&self) -> f64 {
        self.current
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Apply one episode's decay and return the new value.
    pub fn decay(&mut self) -> f64 {
        self.current = (self.current * self.decay).max(self.min);
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
