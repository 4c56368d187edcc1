//! Evaluate command - Roll out a saved agent's greedy policy

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        config::ScenarioArg,
        output::{format_number, format_rate, print_kv, print_section},
    },
    env::Scenario,
    pipeline::{EpisodeRunner, OutcomeCounts},
    q_learning::SavedTdAgent,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained agent")]
pub struct EvaluateArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Scenario to evaluate on (defaults to the one the agent trained on)
    #[arg(long, short = 's', value_enum)]
    pub scenario: Option<ScenarioArg>,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 100)]
    pub episodes: usize,

    /// Random seed for the layout and slip draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Step limit per episode on top of the scenario's own timeout
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Export results to file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EvaluationResults {
    agent: String,
    algorithm: String,
    scenario: &'static str,
    episodes: usize,
    outcomes: OutcomeCounts,
    unfinished: usize,
    success_rate: f64,
    mean_reward: f64,
    mean_steps: f64,
}

fn resolve_scenario(args: &EvaluateArgs, saved: &SavedTdAgent) -> Result<Scenario> {
    if let Some(arg) = args.scenario {
        return Ok(arg.into());
    }
    match &saved.metadata.scenario {
        Some(name) => name
            .parse::<Scenario>()
            .with_context(|| format!("Saved agent names an unknown scenario '{name}'")),
        None => Ok(Scenario::OpenField),
    }
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    println!("Loading trained agent from: {}", args.agent.display());
    let saved = SavedTdAgent::load_from_file(&args.agent)?;
    let scenario = resolve_scenario(&args, &saved)?;
    // Generated layouts must match the training layout, so fall back to the
    // seed the agent was trained with.
    let seed = args.seed.or(saved.metadata.seed);

    print_section("Loaded Agent Info");
    print_kv("Algorithm", &format!("{:?}", saved.algorithm));
    print_kv("Episodes trained", &format_number(saved.metadata.episodes_trained));
    print_kv("Q-table entries", &format_number(saved.q_table_size()));
    if let Some(trained_on) = &saved.metadata.scenario {
        print_kv("Trained on", trained_on);
    }

    let mut learner = saved.to_agent()?.into_box();
    let mut env = scenario
        .build(seed)
        .with_context(|| format!("Failed to build scenario {scenario}"))?;

    let runner = EpisodeRunner::greedy().with_step_limit(args.max_steps);
    let mut outcomes = OutcomeCounts::default();
    let mut unfinished = 0;
    let mut total_reward = 0.0;
    let mut total_steps = 0;
    for episode in 0..args.episodes {
        let summary = runner.run(&mut env, learner.as_mut(), episode, |_| Ok(()))?;
        match summary.done_kind {
            Some(kind) => outcomes.record(kind),
            None => unfinished += 1,
        }
        total_reward += summary.total_reward;
        total_steps += summary.steps;
    }

    let episodes = args.episodes.max(1) as f64;
    let results = EvaluationResults {
        agent: learner.name().to_string(),
        algorithm: format!("{:?}", saved.algorithm),
        scenario: scenario.name(),
        episodes: args.episodes,
        outcomes,
        unfinished,
        success_rate: outcomes.successes() as f64 / episodes,
        mean_reward: total_reward / episodes,
        mean_steps: total_steps as f64 / episodes,
    };

    print_section(&format!("Evaluation on {scenario}"));
    print_kv("Episodes", &format_number(args.episodes));
    print_kv("Goal reached", &format_rate(outcomes.goals, args.episodes));
    if outcomes.captures > 0 {
        print_kv(
            "Adversary captured",
            &format_rate(outcomes.captures, args.episodes),
        );
    }
    print_kv("Caught", &format_rate(outcomes.caught, args.episodes));
    print_kv("Hazard", &format_rate(outcomes.hazards, args.episodes));
    print_kv("Timeout", &format_rate(outcomes.timeouts, args.episodes));
    if unfinished > 0 {
        print_kv("Step limit", &format_rate(unfinished, args.episodes));
    }
    print_kv("Mean return", &format!("{:.2}", results.mean_reward));
    print_kv("Mean steps", &format!("{:.1}", results.mean_steps));

    if let Some(path) = &args.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &results).context("Failed to write results")?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}
