//! Solver hyperparameters.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, error::check_unit_interval};

/// Hyperparameters shared by every solver. Each solver reads the fields it
/// needs: the TD learners use the learning rate and the epsilon schedule,
/// the planners use theta and the iteration cap.
///
/// # Examples
///
/// ```
/// use gridmdp::SolverConfig;
///
/// let config = SolverConfig::new()
///     .with_learning_rate(0.1)
///     .with_discount(0.9)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Learning rate (alpha)
    pub learning_rate: f64,
    /// Discount factor (gamma)
    pub discount: f64,
    pub epsilon: f64,
    pub min_epsilon: f64,
    /// Multiplicative epsilon decay per episode
    pub epsilon_decay: f64,
    /// Convergence threshold for the planners
    pub theta: f64,
    /// Sweep cap for value iteration and for each policy evaluation
    pub max_iterations: usize,
    /// Initial value of unseen Q-table entries
    pub q_init: f64,
    pub seed: Option<u64>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.9,
            epsilon: 0.2,
            min_epsilon: 0.01,
            epsilon_decay: 0.995,
            theta: 1e-4,
            max_iterations: 1000,
            q_init: 0.0,
            seed: None,
        }
    }

    pub fn with_learning_rate(mut self, alpha: f64) -> Self {
        self.learning_rate = alpha;
        self
    }

    pub fn with_discount(mut self, gamma: f64) -> Self {
        self.discount = gamma;
        self
    }

    /// Set initial epsilon, its decay factor and its floor.
    pub fn with_epsilon(mut self, initial: f64, decay: f64, min: f64) -> Self {
        self.epsilon = initial;
        self.epsilon_decay = decay;
        self.min_epsilon = min;
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_q_init(mut self, value: f64) -> Self {
        self.q_init = value;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject parameters outside their ranges instead of letting them turn
    /// into NaN updates later.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("learning_rate", self.learning_rate)?;
        // gamma in (0, 1]; the planners additionally need gamma < 1
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(Error::ParameterOutOfRange {
                name: "discount",
                value: self.discount,
                range: "(0, 1]",
            });
        }
        check_unit_interval("epsilon", self.epsilon)?;
        check_unit_interval("min_epsilon", self.min_epsilon)?;
        check_unit_interval("epsilon_decay", self.epsilon_decay)?;
        if self.min_epsilon > self.epsilon {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "min_epsilon {} exceeds initial epsilon {}",
                    self.min_epsilon, self.epsilon
                ),
            });
        }
        if !(self.theta > 0.0 && self.theta.is_finite()) {
            return Err(Error::ParameterOutOfRange {
                name: "theta",
                value: self.theta,
                range: "(0, inf)",
            });
        }
        if !self.q_init.is_finite() {
            return Err(Error::ParameterOutOfRange {
                name: "q_init",
                value: self.q_init,
                range: "finite values",
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfiguration {
                message: "max_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// [`Self::validate`] plus `gamma < 1`, which the planners need to converge.
    pub fn validate_for_planning(&self) -> Result<()> {
        self.validate()?;
        if self.discount >= 1.0 {
            return Err(Error::ParameterOutOfRange {
                name: "discount",
                value: self.discount,
                range: "(0, 1)",
            });
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_for_planning().is_ok());
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.max_iterations, 1000);
    }

    #[test]
    fn test_out_of_range_parameters_are_rejected() {
        assert!(matches!(
            SolverConfig::new().with_learning_rate(1.5).validate(),
            Err(Error::ParameterOutOfRange {
                name: "learning_rate",
                ..
            })
        ));
        let invalid = [
            SolverConfig::new().with_discount(-0.1),
            SolverConfig::new().with_learning_rate(f64::NAN),
            SolverConfig::new().with_theta(0.0),
            SolverConfig::new().with_epsilon(0.1, 0.99, 0.5),
        ];
        for config in invalid {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_zero_discount_is_rejected() {
        let config = SolverConfig::new().with_discount(0.0);
        assert!(matches!(
            config.validate(),
            Err(Error::ParameterOutOfRange {
                name: "discount",
                ..
            })
        ));
        assert!(config.validate_for_planning().is_err());
    }

    #[test]
    fn test_planning_requires_discount_below_one() {
        let config = SolverConfig::new().with_discount(1.0);
        assert!(config.validate().is_ok());
        assert!(config.validate_for_planning().is_err());
    }
}
