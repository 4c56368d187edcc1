//! Value iteration and policy iteration against the enumerated model.

mod common;

use common::{approx_eq, open_env, small_rewards};
use gridmdp::{
    SolverConfig,
    dynamic_programming::{PolicyIteration, ValueIteration},
    env::{Scenario, TransitionModel},
    pipeline::run_best_policy,
    types::constants::ACTION_COUNT,
};

fn planning_config() -> SolverConfig {
    SolverConfig::new().with_theta(1e-8).with_seed(3)
}

#[test]
fn bellman_sweeps_contract_by_the_discount() {
    let env = Scenario::LavaField.build(Some(9)).unwrap();
    let model = TransitionModel::from_env(&env).unwrap();
    let config = SolverConfig::new().with_discount(0.9);
    let mut planner = ValueIteration::new(model, &config).unwrap();

    let mut previous = planner.sweep();
    for _ in 0..40 {
        let delta = planner.sweep();
        assert!(
            delta <= 0.9 * previous + 1e-9,
            "sweep delta {delta} grew past γ x {previous}"
        );
        previous = delta;
    }
}

#[test]
fn distance_to_the_fixed_point_never_grows() {
    let env = open_env(4, small_rewards(100));
    let config = planning_config().with_discount(0.9);
    let model = || TransitionModel::from_env(&env).unwrap();
    let mut solved = ValueIteration::new(model(), &config).unwrap();
    assert!(solved.solve().converged);
    let optimal = solved.values().clone();

    let mut planner = ValueIteration::new(model(), &config).unwrap();
    let mut previous = planner.values().max_difference(&optimal);
    assert!(previous > 0.0);
    for _ in 0..30 {
        planner.sweep();
        let distance = planner.values().max_difference(&optimal);
        assert!(
            distance <= previous + 1e-9,
            "distance to V* rose from {previous} to {distance}"
        );
        assert!(distance <= 0.9 * previous + 1e-9);
        previous = distance;
    }
    assert!(previous < 1e-6);
}

#[test]
fn policy_iteration_agrees_with_value_iteration() {
    let env = Scenario::LavaField.build(Some(21)).unwrap();
    let config = planning_config();

    let mut vi = ValueIteration::new(TransitionModel::from_env(&env).unwrap(), &config).unwrap();
    let vi_report = vi.solve();
    let mut pi = PolicyIteration::new(TransitionModel::from_env(&env).unwrap(), &config).unwrap();
    let pi_report = pi.solve();

    assert!(vi_report.converged);
    assert!(pi_report.converged);
    assert!(vi.values().max_difference(pi.values()) < 1e-3);

    let states = pi.model().state_count();
    assert!(pi_report.improvement_passes >= 1);
    assert!(pi_report.improvement_passes <= states * ACTION_COUNT);
}

#[test]
fn planned_policy_walks_the_shortest_path() {
    let mut env = open_env(5, small_rewards(100));
    let model = TransitionModel::from_env(&env).unwrap();
    let mut planner = ValueIteration::new(model, &planning_config()).unwrap();
    planner.solve();

    let (start, _) = env.reset();
    // seven moves at -1, then the goal at +100
    assert!(approx_eq(planner.values().get(start), 42.612659, 1e-4));

    let mut follower = planner.follower();
    let rollout = run_best_policy(&mut env, &mut follower).unwrap();
    assert!(rollout.reached_goal());
    assert_eq!(rollout.steps, 8);
    assert_eq!(rollout.total_reward, 93.0);
}

#[test]
fn terminal_states_keep_zero_value_and_no_action() {
    let env = open_env(4, small_rewards(100));
    let model = TransitionModel::from_env(&env).unwrap();
    let goal = env
        .state_space()
        .encode(gridmdp::types::Position::new(3, 3), Default::default());
    assert!(model.is_terminal(goal));

    let mut planner = PolicyIteration::new(model, &planning_config()).unwrap();
    planner.solve();
    assert_eq!(planner.values().get(goal), 0.0);
    assert_eq!(planner.policy().action(goal), None);
    assert_eq!(planner.policy().probabilities(goal), [0.0; ACTION_COUNT]);
}
