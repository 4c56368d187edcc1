//! Training and evaluation pipeline abstractions
//!
//! This module provides composable pipelines for:
//! - Running single episodes in training or greedy mode
//! - Training learners over many episodes
//! - Recording observations during training

pub mod episode;
pub mod observers;
pub mod training;

pub use episode::{
    EpisodeRunner, EpisodeSummary, EpisodeTrace, RunMode, StepRecord, run_best_policy,
};
// Re-export observer implementations (adapters)
pub use observers::{JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver};
pub use training::{OutcomeCounts, TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{Learner, Observer};
