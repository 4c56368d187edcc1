use clap::Parser;
use gridmdp::cli::commands::{
    evaluate::{self, EvaluateArgs},
    solve::{self, SolveArgs},
    train::{self, TrainArgs},
};
use tempfile::tempdir;

#[test]
fn summary_without_extension_appends_json() {
    let tmp = tempdir().unwrap();
    let summary_stem = tmp.path().join("run_overview");

    let args = TrainArgs::parse_from([
        "gridmdp-train",
        "q-learning",
        "--scenario",
        "open-field",
        "--episodes",
        "5",
        "--seed",
        "3",
        "--quiet",
        "--summary",
        summary_stem.to_str().unwrap(),
    ]);

    train::execute(args).expect("training with summary should succeed");

    let expected_path = summary_stem.with_extension("json");
    assert!(
        expected_path.exists(),
        "expected summary at {}",
        expected_path.display()
    );

    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["training"]["total_episodes"], 5);
    assert_eq!(parsed["metrics"]["total_episodes"], 5);
    assert_eq!(parsed["algorithm"], "q-learning");
    assert_eq!(parsed["scenario"], "open-field");
}

#[test]
fn summary_directory_argument_creates_default_file() {
    let tmp = tempdir().unwrap();
    let summary_dir = tmp.path().join("summaries");
    let summary_arg = format!("{}/", summary_dir.display());

    let args = TrainArgs::parse_from([
        "gridmdp-train",
        "sarsa",
        "--episodes",
        "3",
        "--quiet",
        "--summary",
        &summary_arg,
    ]);

    train::execute(args).expect("training with directory summary should succeed");

    let expected_path = summary_dir.join("training_summary.json");
    assert!(
        expected_path.exists(),
        "expected summary at {}",
        expected_path.display()
    );

    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["training"]["total_episodes"], 3);
    assert_eq!(parsed["algorithm"], "sarsa");
}

#[test]
fn trained_agent_can_be_evaluated() {
    let tmp = tempdir().unwrap();
    let agent_path = tmp.path().join("agent.msgpack");
    let export_path = tmp.path().join("evaluation.json");

    let args = TrainArgs::parse_from([
        "gridmdp-train",
        "q-learning",
        "--episodes",
        "20",
        "--seed",
        "5",
        "--quiet",
        "--output",
        agent_path.to_str().unwrap(),
    ]);
    train::execute(args).expect("training should succeed");
    assert!(agent_path.exists());

    let args = EvaluateArgs::parse_from([
        "gridmdp-evaluate",
        agent_path.to_str().unwrap(),
        "--episodes",
        "4",
        "--max-steps",
        "50",
        "--export",
        export_path.to_str().unwrap(),
    ]);
    evaluate::execute(args).expect("evaluation should succeed");

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(parsed["episodes"], 4);
    assert_eq!(parsed["scenario"], "open-field");
    assert_eq!(parsed["agent"], "Q-Learning");
}

#[test]
fn solve_exports_values_and_policy() {
    let tmp = tempdir().unwrap();
    let export_path = tmp.path().join("solution.json");

    let args = SolveArgs::parse_from([
        "gridmdp-solve",
        "policy-iteration",
        "--scenario",
        "lava-field",
        "--seed",
        "4",
        "--theta",
        "1e-9",
        "--export",
        export_path.to_str().unwrap(),
    ]);
    solve::execute(args).expect("solving should succeed");

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(parsed["algorithm"], "policy-iteration");
    assert_eq!(parsed["report"]["converged"], true);
    assert!(parsed["values"].is_object() || parsed["values"].is_array());
}

#[test]
fn solve_rejects_a_discount_of_one() {
    let args = SolveArgs::parse_from(["gridmdp-solve", "value-iteration", "--discount", "1.0"]);
    assert!(solve::execute(args).is_err());
}
