//! Train command - Train Q-learning and SARSA agents on a scenario

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    SolverConfig,
    cli::{
        config::{HyperParams, ScenarioArg},
        output::{format_number, format_rate, print_kv, print_policy_map, print_section},
    },
    env::Scenario,
    pipeline::{
        JsonlObserver, Learner, MetricsObserver, MetricsSummary, ProgressObserver, TrainingConfig,
        TrainingPipeline, TrainingResult,
    },
    q_learning::{QLearningAgent, SarsaAgent, SavedTdAgent, TrainingMetadata},
    types::ActionMask,
};

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    algorithm: &'static str,
    scenario: &'static str,
    seed: Option<u64>,
    config: SolverConfig,
    training: &'a TrainingResult,
    metrics: MetricsSummary,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TdAlgorithmArg {
    /// Q-learning (off-policy TD control)
    QLearning,
    /// SARSA (on-policy TD control)
    Sarsa,
}

impl TdAlgorithmArg {
    fn name(self) -> &'static str {
        match self {
            TdAlgorithmArg::QLearning => "q-learning",
            TdAlgorithmArg::Sarsa => "sarsa",
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a TD learner", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Learning algorithm
    #[arg(value_enum)]
    pub algorithm: TdAlgorithmArg,

    /// Scenario to train on
    #[arg(long, short = 's', value_enum, default_value = "open-field")]
    pub scenario: ScenarioArg,

    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 500)]
    pub episodes: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file for the trained agent (MessagePack)
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Optional file for JSONL observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Include every step in the JSONL observations
    #[arg(long, default_value_t = false)]
    pub record_steps: bool,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Step limit of the greedy rollout after training
    #[arg(long)]
    pub max_eval_steps: Option<usize>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// Print the learned policy as arrows
    #[arg(long, default_value_t = false)]
    pub show_policy: bool,

    #[command(flatten)]
    pub hyper: HyperParams,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let scenario: Scenario = args.scenario.into();
    let config = args.hyper.solver_config(args.seed);
    config.validate().context("Invalid hyperparameters")?;

    let summary_path = args.summary.as_deref().map(sanitize_summary_path);

    let mut env = scenario
        .build(args.seed)
        .with_context(|| format!("Failed to build scenario {scenario}"))?;

    let mut learner: Box<dyn Learner> = match args.algorithm {
        TdAlgorithmArg::QLearning => Box::new(QLearningAgent::new(&config)?),
        TdAlgorithmArg::Sarsa => Box::new(SarsaAgent::new(&config)?),
    };

    print_section(&format!("Training {} on {scenario}", learner.name()));
    print_kv("Episodes", &format_number(args.episodes));
    print_kv("States", &format_number(env.state_count()));
    print_kv("Learning rate", &config.learning_rate.to_string());
    print_kv("Discount", &config.discount.to_string());
    print_kv(
        "Epsilon",
        &format!(
            "{} (×{} per episode, floor {})",
            config.epsilon, config.epsilon_decay, config.min_epsilon
        ),
    );
    if let Some(seed) = args.seed {
        print_kv("Seed", &seed.to_string());
    }

    let training_config = TrainingConfig {
        episodes: args.episodes,
        seed: args.seed,
        max_eval_steps: args.max_eval_steps,
    };

    let metrics = Arc::new(Mutex::new(MetricsObserver::new()));
    let mut pipeline =
        TrainingPipeline::new(training_config).with_observer(Box::new(Arc::clone(&metrics)));
    if !args.quiet {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create observations file {}", path.display()))?
            .with_steps(args.record_steps);
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let result = pipeline.run(&mut env, learner.as_mut())?;

    print_section("Training Results");
    let outcomes = result.outcomes;
    let total = result.total_episodes;
    print_kv("Goal reached", &format_rate(outcomes.goals, total));
    if outcomes.captures > 0 {
        print_kv("Adversary captured", &format_rate(outcomes.captures, total));
    }
    print_kv("Caught", &format_rate(outcomes.caught, total));
    print_kv("Hazard", &format_rate(outcomes.hazards, total));
    print_kv("Timeout", &format_rate(outcomes.timeouts, total));
    print_kv("Mean return", &format!("{:.2}", result.mean_reward));
    print_kv(
        "Recent mean return",
        &format!("{:.2}", result.recent_mean_reward),
    );
    if let (Some(reward), Some(episode)) = (result.best_reward, result.best_episode) {
        print_kv(
            "Best episode",
            &format!(
                "#{episode} return {reward:.2} in {} steps",
                result.best_trace.len()
            ),
        );
    }
    if let Some(epsilon) = result.final_epsilon {
        print_kv("Final epsilon", &format!("{epsilon:.4}"));
    }
    if let Some(evaluation) = &result.evaluation {
        let outcome = evaluation
            .done_kind
            .map_or_else(|| "step limit".to_string(), |kind| format!("{kind:?}"));
        print_kv(
            "Greedy rollout",
            &format!(
                "{outcome} after {} steps, return {:.2}",
                evaluation.steps, evaluation.total_reward
            ),
        );
    }

    if args.show_policy {
        let masks = (0..env.state_count())
            .map(|state| env.valid_actions(state))
            .collect::<crate::Result<Vec<ActionMask>>>()?;
        print_policy_map(&env, &learner.policy(&masks));
    }

    if let Some(output_path) = &args.output {
        let metadata = TrainingMetadata {
            episodes_trained: result.total_episodes,
            scenario: Some(scenario.name().to_string()),
            seed: args.seed,
            config: Some(config),
        };
        let saved = SavedTdAgent::from_learner(learner.as_ref(), metadata)?;
        saved.save_to_file(output_path)?;
        println!("\n✓ Agent saved to: {}", output_path.display());
    }

    if let Some(path) = summary_path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create summary directory {}", parent.display())
                })?;
            }
        }
        let metrics = metrics
            .lock()
            .map_err(|_| anyhow!("metrics observer lock poisoned"))?
            .summary();
        let summary = TrainingSummaryFile {
            algorithm: args.algorithm.name(),
            scenario: scenario.name(),
            seed: args.seed,
            config,
            training: &result,
            metrics,
        };
        let file = File::create(&path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        to_writer_pretty(file, &summary).context("Failed to write training summary")?;
        println!("✓ Summary written to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_summary_path() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/run")),
            PathBuf::from("out/run.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/run.JSON")),
            PathBuf::from("out/run.JSON")
        );
        let dir = format!("out{}", std::path::MAIN_SEPARATOR);
        assert_eq!(
            sanitize_summary_path(Path::new(&dir)),
            PathBuf::from("out").join("training_summary.json")
        );
    }
}
