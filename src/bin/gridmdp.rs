//! gridmdp CLI - Grid-world MDP toolkit
//!
//! This CLI provides a unified interface for:
//! - Training Q-learning and SARSA agents on the built-in scenarios
//! - Solving scenarios with value iteration or policy iteration
//! - Evaluating saved agents

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gridmdp")]
#[command(version, about = "Grid-world MDP simulations and tabular solvers", long_about = None)]
struct Cli {
    /// Print debug logs to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-learning or SARSA agent
    Train(Box<gridmdp::cli::commands::train::TrainArgs>),

    /// Plan a policy with value or policy iteration
    Solve(gridmdp::cli::commands::solve::SolveArgs),

    /// Evaluate a saved agent's greedy policy
    Evaluate(gridmdp::cli::commands::evaluate::EvaluateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    gridmdp::cli::init_tracing(cli.verbose);

    match cli.command {
        Commands::Train(args) => gridmdp::cli::commands::train::execute(*args),
        Commands::Solve(args) => gridmdp::cli::commands::solve::execute(args),
        Commands::Evaluate(args) => gridmdp::cli::commands::evaluate::execute(args),
    }
}
