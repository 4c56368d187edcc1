//! Error types for the gridmdp crate

use thiserror::Error;

use crate::types::Position;

/// Main error type for the gridmdp crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("parameter '{name}' = {value} is outside {range}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("invalid action index {index} (expected 0-3)")]
    InvalidAction { index: usize },

    #[error("position {position} is outside a {size}x{size} grid")]
    PositionOutOfBounds { position: Position, size: usize },

    #[error("cannot place {what} on wall at {position}")]
    WallConflict {
        what: &'static str,
        position: Position,
    },

    #[error("invalid character '{character}' at row {row}, column {column} of layout")]
    InvalidLayoutCharacter {
        character: char,
        row: usize,
        column: usize,
    },

    #[error("layout row {row} has {got} cells, expected {expected}")]
    InvalidLayoutShape {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("no path from {start} to {goal} after removing all stochastic cells")]
    UnreachableGoal { start: Position, goal: Position },

    #[error("state {state} is outside the state space of size {size}")]
    StateOutOfRange { state: usize, size: usize },

    #[error("episode already finished; call reset() first")]
    EpisodeFinished,

    #[error("observer lock poisoned")]
    ObserverPoisoned,

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

/// Reject `value` unless it lies in the closed unit interval.
pub(crate) fn check_unit_interval(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ParameterOutOfRange {
            name,
            value,
            range: "[0, 1]",
        })
    }
}
