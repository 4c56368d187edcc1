//! Procedural lava fields with slip cells and path repair

use std::collections::VecDeque;

use rand::{Rng, rngs::StdRng};
use tracing::debug;

use super::{
    cell::CellType,
    layout::{Grid, Layout},
};
use crate::{Error, Result, types::Position};

/// Breadth-first reachability from `start` to `goal`, treating walls and
/// every cell for which `blocked` returns true as impassable.
pub fn reachable(
    grid: &Grid,
    start: Position,
    goal: Position,
    blocked: impl Fn(CellType) -> bool,
) -> bool {
    if !grid.is_walkable(start) {
        return false;
    }
    let size = grid.size();
    let mut visited = vec![false; size * size];
    let index = |pos: Position| pos.x as usize + pos.y as usize * size;
    let mut queue = VecDeque::from([start]);
    visited[index(start)] = true;

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return true;
        }
        for neighbor in grid.neighbors(current) {
            let next = neighbor.position;
            if !visited[index(next)] && !blocked(grid.cell_type(next)) {
                visited[index(next)] = true;
                queue.push_back(next);
            }
        }
    }
    false
}

/// Generator for lava fields: terminal hazards at fixed spots, slip cells
/// scattered mostly next to them, goal in the far corner.
#[derive(Debug, Clone)]
pub struct LavaFieldGenerator {
    pub size: usize,
    pub start: Position,
    pub goal: Position,
    pub lava: Vec<Position>,
    pub slip_count: usize,
    /// Probability of drawing a slip cell from the lava-adjacent pool
    pub adjacent_bias: f64,
    pub max_attempts: usize,
}

impl Default for LavaFieldGenerator {
    fn default() -> Self {
        let lava = [
            (3, 3),
            (6, 6),
            (2, 7),
            (4, 4),
            (5, 7),
            (7, 3),
            (1, 8),
            (8, 1),
        ]
        .into_iter()
        .map(Position::from)
        .collect();
        Self {
            size: 10,
            start: Position::new(0, 0),
            goal: Position::new(9, 9),
            lava,
            slip_count: 18,
            adjacent_bias: 0.97,
            max_attempts: 1000,
        }
    }
}

impl LavaFieldGenerator {
    /// Build a layout. Slip cells that cut every start-to-goal path are
    /// removed, most recently placed first, until a safe path exists.
    ///
    /// # Errors
    ///
    /// [`Error::UnreachableGoal`] if the lava alone walls off the goal.
    pub fn generate(&self, rng: &mut StdRng) -> Result<Layout> {
        let mut grid = Grid::new(self.size)?;
        for &pos in [self.start, self.goal].iter() {
            if !grid.contains(pos) {
                return Err(Error::PositionOutOfBounds {
                    position: pos,
                    size: self.size,
                });
            }
        }
        if self.lava.contains(&self.start) {
            return Err(Error::InvalidConfiguration {
                message: format!("start {} is covered by lava", self.start),
            });
        }
        grid.set(self.goal, CellType::GoalOpen)?;
        grid.fill(&self.lava, CellType::Hazard)?;

        let is_free = |grid: &Grid, pos: Position| {
            grid.contains(pos)
                && grid.cell_type(pos) == CellType::Empty
                && pos != self.start
                && pos != self.goal
        };

        let mut adjacent: Vec<Position> = Vec::new();
        for lava in &self.lava {
            for neighbor in lava.probe_ring() {
                if is_free(&grid, neighbor) && !adjacent.contains(&neighbor) {
                    adjacent.push(neighbor);
                }
            }
        }

        let mut placed: Vec<Position> = Vec::new();
        let mut attempts = 0;
        while placed.len() < self.slip_count && attempts < self.max_attempts {
            attempts += 1;
            let spot = if !adjacent.is_empty() && rng.random::<f64>() < self.adjacent_bias {
                let index = rng.random_range(0..adjacent.len());
                Some(adjacent.remove(index))
            } else {
                let free: Vec<Position> = grid.positions().filter(|&p| is_free(&grid, p)).collect();
                (!free.is_empty()).then(|| free[rng.random_range(0..free.len())])
            };
            if let Some(spot) = spot.filter(|&spot| is_free(&grid, spot)) {
                grid.set(spot, CellType::Slip)?;
                placed.push(spot);
            }
        }

        let blocked = |cell: CellType| matches!(cell, CellType::Hazard | CellType::Slip);
        while !reachable(&grid, self.start, self.goal, blocked) {
            let Some(cell) = placed.pop() else {
                return Err(Error::UnreachableGoal {
                    start: self.start,
                    goal: self.goal,
                });
            };
            debug!(%cell, "removing slip cell to restore a safe path");
            grid.set(cell, CellType::Empty)?;
        }

        Ok(Layout {
            grid,
            start: self.start,
            adversary_start: None,
        })
    }
}
