//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events,
//! allowing composable data collection without coupling the training
//! loop to specific output formats or metrics.

use std::sync::{Arc, Mutex};

use crate::{
    Error, Result,
    pipeline::{EpisodeSummary, StepRecord},
};

/// Observer trait for monitoring training
///
/// Observers can be composed to collect different types of data during training.
/// Examples include:
/// - Progress bars for user feedback
/// - JSONL export for analysis
/// - Metrics tracking for evaluation
///
/// # Event Sequence
///
/// The observer methods are called in the following order:
/// 1. `on_training_start(total_episodes)` - Once at the beginning
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(record)` - For each environment step
///    - `on_episode_end(summary)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use gridmdp::{pipeline::EpisodeSummary, ports::Observer};
///
/// struct GoalCounter {
///     goals: usize,
/// }
///
/// impl Observer for GoalCounter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> gridmdp::Result<()> {
///         if summary.reached_goal() {
///             self.goals += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to initialize observation state.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called when an episode starts.
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to reset per-episode state.
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after every environment step, before the next action is chosen.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn on_step(&mut self, _record: &StepRecord) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends.
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to record episode outcomes.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    ///
    /// Use this to finalize outputs, close files, or display summaries.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Shared observers, so a caller can keep a handle and read results after
/// the pipeline has consumed its boxed copy.
impl<O: Observer> Observer for Arc<Mutex<O>> {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        self.lock()
            .map_err(|_| Error::ObserverPoisoned)?
            .on_training_start(total_episodes)
    }

    fn on_episode_start(&mut self, episode: usize) -> Result<()> {
        self.lock()
            .map_err(|_| Error::ObserverPoisoned)?
            .on_episode_start(episode)
    }

    fn on_step(&mut self, record: &StepRecord) -> Result<()> {
        self.lock()
            .map_err(|_| Error::ObserverPoisoned)?
            .on_step(record)
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.lock()
            .map_err(|_| Error::ObserverPoisoned)?
            .on_episode_end(summary)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.lock()
            .map_err(|_| Error::ObserverPoisoned)?
            .on_training_end()
    }
}
