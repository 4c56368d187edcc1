//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::{
    episode::{EpisodeSummary, StepRecord},
    training::OutcomeCounts,
};
use crate::{Result, env::DoneKind, ports::Observer};

/// Complete observation of a training episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Episode number
    pub episode: usize,
    /// Final outcome
    pub outcome: Option<DoneKind>,
    pub total_reward: f64,
    pub epsilon: Option<f64>,
    /// Total steps in the episode
    pub total_steps: usize,
    /// Steps in the episode (empty unless step recording is enabled)
    pub steps: Vec<StepRecord>,
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    outcomes: OutcomeCounts,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            outcomes: OutcomeCounts::default(),
        }
    }

    fn message(&self) -> String {
        format!(
            "goal:{} caught:{} hazard:{} timeout:{}",
            self.outcomes.successes(),
            self.outcomes.caught,
            self.outcomes.hazards,
            self.outcomes.timeouts
        )
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        if let Some(kind) = summary.done_kind {
            self.outcomes.record(kind);
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.episode as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
pub struct MetricsObserver {
    outcomes: OutcomeCounts,
    total_episodes: usize,
    episode_lengths: Vec<usize>,
    rewards: Vec<f64>,
    first_success: Option<usize>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self {
            outcomes: OutcomeCounts::default(),
            total_episodes: 0,
            episode_lengths: Vec::new(),
            rewards: Vec::new(),
            first_success: None,
        }
    }

    /// Fraction of episodes ending in goal arrival or a powered capture
    pub fn success_rate(&self) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.outcomes.successes() as f64 / self.total_episodes as f64
        }
    }

    /// Get average episode length
    pub fn avg_episode_length(&self) -> f64 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f64 / self.episode_lengths.len() as f64
        }
    }

    pub fn avg_reward(&self) -> f64 {
        if self.rewards.is_empty() {
            0.0
        } else {
            self.rewards.iter().sum::<f64>() / self.rewards.len() as f64
        }
    }

    /// Per-episode returns in order
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_episodes: self.total_episodes,
            outcomes: self.outcomes,
            success_rate: self.success_rate(),
            avg_episode_length: self.avg_episode_length(),
            avg_reward: self.avg_reward(),
            first_success: self.first_success,
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_episodes: usize,
    pub outcomes: OutcomeCounts,
    pub success_rate: f64,
    pub avg_episode_length: f64,
    pub avg_reward: f64,
    /// First episode that reached the goal or captured the adversary
    pub first_success: Option<usize>,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.episode_lengths.push(0);
        Ok(())
    }

    fn on_step(&mut self, _record: &StepRecord) -> Result<()> {
        if let Some(last) = self.episode_lengths.last_mut() {
            *last += 1;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.total_episodes += 1;
        self.rewards.push(summary.total_reward);
        if let Some(kind) = summary.done_kind {
            self.outcomes.record(kind);
        }
        if summary.succeeded() && self.first_success.is_none() {
            self.first_success = Some(summary.episode);
        }
        Ok(())
    }
}

/// JSONL observer - Exports observations to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    record_steps: bool,
    current_episode_steps: Vec<StepRecord>,
}

impl JsonlObserver {
    /// Create a new JSONL observer writing one line per episode
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self {
            writer,
            record_steps: false,
            current_episode_steps: Vec::new(),
        })
    }

    /// Include every step of the episode in its line
    pub fn with_steps(mut self, record_steps: bool) -> Self {
        self.record_steps = record_steps;
        self
    }
}

impl Observer for JsonlObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.current_episode_steps.clear();
        Ok(())
    }

    fn on_step(&mut self, record: &StepRecord) -> Result<()> {
        if self.record_steps {
            self.current_episode_steps.push(record.clone());
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let observation = Observation {
            episode: summary.episode,
            outcome: summary.done_kind,
            total_reward: summary.total_reward,
            epsilon: summary.epsilon,
            total_steps: summary.steps,
            steps: std::mem::take(&mut self.current_episode_steps),
        };

        // Write as JSONL (one JSON object per line)
        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;

        Ok(())
    }
}
