//! Breadth-first chase.

use std::collections::VecDeque;

use super::{Step, candidate_steps};
use crate::{grid::Grid, types::Position};

/// First step of a shortest path from `from` to `target`.
///
/// The search expands neighbours in action order and continues from a
/// teleporter's exit when it steps onto a mouth. It stops as soon as the
/// target is discovered. Returns `None` when already on the target or when
/// no path exists.
pub fn shortest_path_step(grid: &Grid, from: Position, target: Position) -> Option<Step> {
    if from == target {
        return None;
    }
    let size = grid.size();
    let index = |pos: Position| pos.x as usize + pos.y as usize * size;
    // predecessor and the step taken from it
    let mut came_from: Vec<Option<(Position, Step)>> = vec![None; size * size];
    let mut visited = vec![false; size * size];
    visited[index(from)] = true;
    let mut queue = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        for step in candidate_steps(grid, current) {
            let next = step.landed;
            if visited[index(next)] {
                continue;
            }
            visited[index(next)] = true;
            came_from[index(next)] = Some((current, step));
            if next == target {
                return Some(first_step(&came_from, index, from, target));
            }
            queue.push_back(next);
        }
    }
    None
}

fn first_step(
    came_from: &[Option<(Position, Step)>],
    index: impl Fn(Position) -> usize,
    from: Position,
    target: Position,
) -> Step {
    let mut cursor = target;
    let mut step = Step {
        stepped: target,
        landed: target,
    };
    while let Some((previous, taken)) = came_from[index(cursor)] {
        step = taken;
        if previous == from {
            break;
        }
        cursor = previous;
    }
    step
}

/// Greedy fallback: the neighbour move that lands closest to `target`,
/// provided it is strictly closer than staying put.
pub fn greedy_step(grid: &Grid, from: Position, target: Position) -> Option<Step> {
    let mut best_distance = from.manhattan(target);
    let mut best = None;
    for step in candidate_steps(grid, from) {
        let distance = step.landed.manhattan(target);
        if distance < best_distance {
            best_distance = distance;
            best = Some(step);
        }
    }
    best
}
