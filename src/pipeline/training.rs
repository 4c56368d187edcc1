//! Training pipeline for learnable agents

use serde::{Deserialize, Serialize};
use tracing::info;

use super::episode::{EpisodeRunner, EpisodeSummary, EpisodeTrace};
use crate::{
    Result,
    env::{DoneKind, GridEnvironment},
    ports::{Learner, Observer},
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub episodes: usize,

    /// Random seed for the learner and the environment
    pub seed: Option<u64>,

    /// Step limit of the greedy rollout after training (`None`: the
    /// environment's own timeout)
    pub max_eval_steps: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            seed: None,
            max_eval_steps: None,
        }
    }
}

/// Episode counts per terminal outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub goals: usize,
    pub caught: usize,
    pub captures: usize,
    pub hazards: usize,
    pub timeouts: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, kind: DoneKind) {
        match kind {
            DoneKind::GoalReached => self.goals += 1,
            DoneKind::CaughtByAdversary => self.caught += 1,
            DoneKind::AdversaryCaptured => self.captures += 1,
            DoneKind::Hazard => self.hazards += 1,
            DoneKind::Timeout => self.timeouts += 1,
        }
    }

    pub fn successes(&self) -> usize {
        self.goals + self.captures
    }
}

/// Result of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Learner name
    pub learner: String,

    /// Total episodes played
    pub total_episodes: usize,

    pub outcomes: OutcomeCounts,

    /// Fraction of episodes that reached the goal or captured the adversary
    pub success_rate: f64,

    /// Mean return per episode
    pub mean_reward: f64,

    /// Mean return over the last tenth of training
    pub recent_mean_reward: f64,

    /// Highest return of any episode and where it happened
    pub best_reward: Option<f64>,
    pub best_episode: Option<usize>,

    /// Trace of the highest-return episode
    pub best_trace: EpisodeTrace,

    /// Exploration rate after the last episode
    pub final_epsilon: Option<f64>,

    /// Greedy rollout of the trained learner
    pub evaluation: Option<EpisodeSummary>,
}

impl TrainingResult {
    /// Create a new training result from per-episode returns
    pub fn new(learner: &str, outcomes: OutcomeCounts, rewards: &[f64]) -> Self {
        let total_episodes = rewards.len();
        let success_rate = if total_episodes > 0 {
            outcomes.successes() as f64 / total_episodes as f64
        } else {
            0.0
        };
        let mean_reward = if total_episodes > 0 {
            rewards.iter().sum::<f64>() / total_episodes as f64
        } else {
            0.0
        };
        let recent = &rewards[total_episodes - (total_episodes / 10).max(1).min(total_episodes)..];
        let recent_mean_reward = if recent.is_empty() {
            0.0
        } else {
            recent.iter().sum::<f64>() / recent.len() as f64
        };

        Self {
            learner: learner.to_string(),
            total_episodes,
            outcomes,
            success_rate,
            mean_reward,
            recent_mean_reward,
            best_reward: None,
            best_episode: None,
            best_trace: EpisodeTrace::new(),
            final_epsilon: None,
            evaluation: None,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Keeps the highest-return episode seen so far.
#[derive(Debug, Clone, Default)]
struct BestEpisode {
    reward: Option<f64>,
    episode: Option<usize>,
    trace: EpisodeTrace,
}

impl BestEpisode {
    fn offer(&mut self, summary: &EpisodeSummary) {
        if self.reward.is_none_or(|best| summary.total_reward > best) {
            self.reward = Some(summary.total_reward);
            self.episode = Some(summary.episode);
            self.trace = summary.trace.clone();
        }
    }
}

/// Training pipeline for a single learner in one environment
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train for the configured number of episodes, then roll out the
    /// greedy policy once.
    pub fn run(
        &mut self,
        env: &mut GridEnvironment,
        learner: &mut dyn Learner,
    ) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            learner.set_rng_seed(seed)?;
            env.seed(seed.wrapping_add(1));
        }

        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        let runner = EpisodeRunner::training();
        let mut outcomes = OutcomeCounts::default();
        let mut rewards = Vec::with_capacity(self.config.episodes);
        let mut best = BestEpisode::default();

        for episode in 0..self.config.episodes {
            for observer in &mut self.observers {
                observer.on_episode_start(episode)?;
            }

            let observers = &mut self.observers;
            let summary = runner.run(env, &mut *learner, episode, |record| {
                for observer in observers.iter_mut() {
                    observer.on_step(record)?;
                }
                Ok(())
            })?;

            if let Some(kind) = summary.done_kind {
                outcomes.record(kind);
            }
            rewards.push(summary.total_reward);
            best.offer(&summary);

            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let evaluation = EpisodeRunner::greedy()
            .with_step_limit(self.config.max_eval_steps)
            .run(env, &mut *learner, self.config.episodes, |_| Ok(()))?;

        let mut result = TrainingResult::new(learner.name(), outcomes, &rewards);
        result.best_reward = best.reward;
        result.best_episode = best.episode;
        result.best_trace = best.trace;
        result.final_epsilon = learner.epsilon();
        result.evaluation = Some(evaluation);

        info!(
            learner = %result.learner,
            episodes = result.total_episodes,
            success_rate = result.success_rate,
            mean_reward = result.mean_reward,
            "training finished"
        );
        Ok(result)
    }
}
