//! End-to-end behaviour of the Q-learning and SARSA agents.

mod common;

use common::{masks, open_env, small_rewards};
use gridmdp::{
    SolverConfig,
    env::Scenario,
    pipeline::{Learner, TrainingConfig, TrainingPipeline},
    ports::Transition,
    q_learning::{QLearningAgent, QTable, SarsaAgent},
    types::{Action, ActionMask, Position},
};

fn assert_moves_toward_corner(learner: &dyn Learner, env: &gridmdp::env::GridEnvironment) {
    let masks = masks(env);
    let policy = learner.policy(&masks);
    let goal = Position::new(3, 3);
    for (state, mask) in masks.iter().enumerate() {
        let (pos, _) = env.state_space().decode(state).unwrap();
        if pos == goal {
            continue;
        }
        let action = learner.greedy_action(state, *mask);
        assert!(
            matches!(action, Action::Right | Action::Down),
            "{} picks {action} at {pos}",
            learner.name()
        );
        assert_eq!(policy.action(state), Some(action));
    }
}

#[test]
fn q_learning_finds_the_shortest_path_across_the_open_field() {
    let mut env = Scenario::OpenField.build(Some(42)).unwrap();
    let mut agent = QLearningAgent::new(&SolverConfig::new()).unwrap();
    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: 500,
        seed: Some(42),
        max_eval_steps: None,
    });

    let result = pipeline.run(&mut env, &mut agent).unwrap();

    let evaluation = result.evaluation.expect("greedy rollout");
    assert!(evaluation.reached_goal());
    assert_eq!(evaluation.steps, 18);
    assert_eq!(evaluation.total_reward, 83.0);
    assert!(result.outcomes.goals > 0);
    let epsilon = result.final_epsilon.unwrap();
    assert!(epsilon < 0.2 && epsilon >= 0.01);
}

#[test]
fn both_agents_learn_to_head_for_the_far_corner() {
    let config = SolverConfig::new()
        .with_epsilon(1.0, 0.999, 0.3)
        .with_seed(11);
    let training = TrainingConfig {
        episodes: 3000,
        seed: Some(11),
        max_eval_steps: Some(20),
    };

    let mut env = open_env(4, small_rewards(100));
    let mut q_agent = QLearningAgent::new(&config).unwrap();
    TrainingPipeline::new(training.clone())
        .run(&mut env, &mut q_agent)
        .unwrap();
    assert_moves_toward_corner(&q_agent, &env);

    let mut env = open_env(4, small_rewards(100));
    let mut sarsa = SarsaAgent::new(&config).unwrap();
    let result = TrainingPipeline::new(training)
        .run(&mut env, &mut sarsa)
        .unwrap();
    assert_moves_toward_corner(&sarsa, &env);
    assert_eq!(result.final_epsilon, Some(0.3));
    assert_eq!(result.evaluation.unwrap().steps, 6);
}

#[test]
fn terminal_updates_converge_on_the_reward_alone() {
    let mut table = QTable::new(0.5, 0.9, 0.0);
    table.set(1, Action::Right, 1000.0);

    table.q_learning_update(0, Action::Right, 10.0, 1, ActionMask::ALL, true);
    assert_eq!(table.get(0, Action::Right), 5.0);
    table.q_learning_update(0, Action::Right, 10.0, 1, ActionMask::ALL, true);
    assert_eq!(table.get(0, Action::Right), 7.5);

    for _ in 0..60 {
        table.q_learning_update(0, Action::Right, 10.0, 1, ActionMask::ALL, true);
    }
    let settled = table.get(0, Action::Right);
    assert!((settled - 10.0).abs() < 1e-9);
    table.q_learning_update(0, Action::Right, 10.0, 1, ActionMask::ALL, true);
    assert!((table.get(0, Action::Right) - settled).abs() < 1e-9);
}

#[test]
fn sarsa_commits_to_a_valid_next_action_until_the_episode_ends() {
    let mut agent = SarsaAgent::new(&SolverConfig::new().with_seed(5)).unwrap();
    let only_down = ActionMask::new([false, false, true, false]);

    let next = agent
        .update(&Transition {
            state: 0,
            action: Action::Right,
            reward: -1.0,
            next_state: 1,
            done: false,
            next_valid: only_down,
        })
        .unwrap();
    assert_eq!(next, Some(Action::Down));

    let next = agent
        .update(&Transition {
            state: 1,
            action: Action::Down,
            reward: 100.0,
            next_state: 5,
            done: true,
            next_valid: ActionMask::ALL,
        })
        .unwrap();
    assert_eq!(next, None);
    assert_eq!(agent.q_table().get(1, Action::Down), 10.0);
}

#[test]
fn q_learning_never_commits_to_a_next_action() {
    let mut agent = QLearningAgent::new(&SolverConfig::new().with_seed(5)).unwrap();
    let next = agent
        .update(&Transition {
            state: 0,
            action: Action::Down,
            reward: -1.0,
            next_state: 4,
            done: false,
            next_valid: ActionMask::ALL,
        })
        .unwrap();
    assert_eq!(next, None);
    assert!((agent.q_table().get(0, Action::Down) + 0.1).abs() < 1e-12);
}
