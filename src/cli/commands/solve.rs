//! Solve command - Plan an optimal policy with value or policy iteration

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::{
    cli::{
        config::{HyperParams, ScenarioArg},
        output::{create_spinner, format_number, print_kv, print_policy_map, print_section},
    },
    dynamic_programming::{PolicyFollower, PolicyIteration, SolveReport, ValueIteration},
    env::{Scenario, TransitionModel},
    pipeline::{EpisodeSummary, Learner, run_best_policy},
    policy::{Policy, ValueTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlannerArg {
    /// Synchronous Bellman-optimality sweeps
    ValueIteration,
    /// Alternating evaluation and greedy improvement
    PolicyIteration,
}

impl PlannerArg {
    fn name(self) -> &'static str {
        match self {
            PlannerArg::ValueIteration => "value-iteration",
            PlannerArg::PolicyIteration => "policy-iteration",
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Solve a scenario with a model-based planner")]
pub struct SolveArgs {
    /// Planning algorithm
    #[arg(value_enum)]
    pub algorithm: PlannerArg,

    /// Scenario to solve
    #[arg(long, short = 's', value_enum, default_value = "lava-field")]
    pub scenario: ScenarioArg,

    /// Random seed for the generated layout and the initial policy
    #[arg(long)]
    pub seed: Option<u64>,

    /// Export values and policy to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the planned policy as arrows
    #[arg(long, default_value_t = false)]
    pub show_policy: bool,

    #[command(flatten)]
    pub hyper: HyperParams,
}

#[derive(Debug, Serialize)]
struct SolutionExport<'a> {
    scenario: &'static str,
    algorithm: &'static str,
    report: SolveReport,
    rollout: &'a EpisodeSummary,
    values: &'a ValueTable,
    policy: &'a Policy,
}

pub fn execute(args: SolveArgs) -> Result<()> {
    let scenario: Scenario = args.scenario.into();
    let config = args.hyper.solver_config(args.seed);

    let mut env = scenario
        .build(args.seed)
        .with_context(|| format!("Failed to build scenario {scenario}"))?;
    let model = TransitionModel::from_env(&env).context("Failed to enumerate transitions")?;

    print_section(&format!("Solving {scenario} with {}", args.algorithm.name()));
    print_kv("States", &format_number(model.state_count()));
    print_kv("Discount", &config.discount.to_string());
    print_kv("Theta", &config.theta.to_string());

    let spinner = create_spinner("Sweeping state space...")?;
    let (report, mut follower): (SolveReport, PolicyFollower) = match args.algorithm {
        PlannerArg::ValueIteration => {
            let mut planner = ValueIteration::new(model, &config)?;
            let report = planner.solve();
            (report, planner.follower())
        }
        PlannerArg::PolicyIteration => {
            let mut planner = PolicyIteration::new(model, &config)?;
            let report = planner.solve();
            (report, planner.follower())
        }
    };
    spinner.finish_and_clear();

    print_section("Planning Results");
    print_kv("Converged", if report.converged { "yes" } else { "no" });
    print_kv("Sweeps", &format_number(report.sweeps));
    if args.algorithm == PlannerArg::PolicyIteration {
        print_kv("Improvement passes", &format_number(report.improvement_passes));
    }
    print_kv("Final delta", &format!("{:.2e}", report.delta));

    let (start, _) = env.reset();
    let start_value = follower.value_table(&[]).get(start);
    print_kv("Value of start", &format!("{start_value:.3}"));

    let rollout = run_best_policy(&mut env, &mut follower)?;
    let outcome = rollout
        .done_kind
        .map_or_else(|| "unfinished".to_string(), |kind| format!("{kind:?}"));
    print_kv(
        "Greedy rollout",
        &format!(
            "{outcome} after {} steps, return {:.2}",
            rollout.steps, rollout.total_reward
        ),
    );

    if args.show_policy {
        print_policy_map(&env, follower.inner_policy());
    }

    if let Some(path) = &args.export {
        let values = follower.value_table(&[]);
        let export = SolutionExport {
            scenario: scenario.name(),
            algorithm: args.algorithm.name(),
            report,
            rollout: &rollout,
            values: &values,
            policy: follower.inner_policy(),
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &export).context("Failed to write solution")?;
        println!("\n✓ Solution exported to: {}", path.display());
    }

    Ok(())
}
