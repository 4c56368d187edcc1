//! Redraw distribution for slip tiles.

use rand::Rng;

use crate::{
    grid::{CellType, Grid},
    types::{Action, Position, constants::ACTION_COUNT},
};

/// Share of probability mass given to moves that enter a hazard.
pub const HAZARD_MASS: f64 = 0.6;

/// Direction distribution for a slip tile at a given position.
///
/// Uniform over the valid directions unless a hazard is adjacent, in which
/// case hazard-bound moves share 60% of the mass and the rest share 40%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlipDistribution {
    probabilities: [f64; ACTION_COUNT],
}

impl SlipDistribution {
    pub fn for_cell(grid: &Grid, pos: Position) -> Self {
        let neighbors = grid.neighbors(pos);
        let mut probabilities = [0.0; ACTION_COUNT];
        if neighbors.is_empty() {
            return Self { probabilities };
        }

        let hazard_count = neighbors
            .iter()
            .filter(|n| grid.cell_type(n.position) == CellType::Hazard)
            .count();
        let other_count = neighbors.len() - hazard_count;

        for neighbor in &neighbors {
            let is_hazard = grid.cell_type(neighbor.position) == CellType::Hazard;
            probabilities[neighbor.action.index()] = match (hazard_count, other_count) {
                (0, n) => 1.0 / n as f64,
                (h, 0) => 1.0 / h as f64,
                (h, _) if is_hazard => HAZARD_MASS / h as f64,
                (_, n) => (1.0 - HAZARD_MASS) / n as f64,
            };
        }
        Self { probabilities }
    }

    pub fn probability(&self, action: Action) -> f64 {
        self.probabilities[action.index()]
    }

    pub fn probabilities(&self) -> [f64; ACTION_COUNT] {
        self.probabilities
    }

    /// Draw a direction. `None` when the tile has no walkable neighbour.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Action> {
        let r: f64 = rng.random();
        let mut cumulative = 0.0;
        let mut last = None;
        for action in Action::ALL {
            let p = self.probability(action);
            if p <= 0.0 {
                continue;
            }
            cumulative += p;
            last = Some(action);
            if r < cumulative {
                return Some(action);
            }
        }
        // rounding left r above the cumulative total
        last
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::grid::Layout;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_uniform_without_adjacent_hazard() {
        let layout = Layout::parse(
            "
            S..
            .~.
            .#.
            ",
        )
        .unwrap();
        let dist = SlipDistribution::for_cell(&layout.grid, Position::new(1, 1));
        let p = dist.probabilities();
        assert!(approx_eq(p.iter().sum(), 1.0));
        assert!(approx_eq(dist.probability(Action::Up), 1.0 / 3.0));
        assert_eq!(dist.probability(Action::Down), 0.0);
    }

    #[test]
    fn test_single_adjacent_hazard_gets_sixty_percent() {
        let layout = Layout::parse(
            "
            S..
            H~.
            ...
            ",
        )
        .unwrap();
        let dist = SlipDistribution::for_cell(&layout.grid, Position::new(1, 1));
        assert!(approx_eq(dist.probability(Action::Left), 0.6));
        for action in [Action::Up, Action::Right, Action::Down] {
            assert!(approx_eq(dist.probability(action), 0.4 / 3.0));
        }
        assert!(approx_eq(dist.probabilities().iter().sum(), 1.0));
    }

    #[test]
    fn test_every_slip_cell_sums_to_one() {
        let layout = crate::grid::presets::freeze_chase().unwrap();
        for pos in layout.grid.positions_of(CellType::Slip) {
            let dist = SlipDistribution::for_cell(&layout.grid, pos);
            assert!(approx_eq(dist.probabilities().iter().sum(), 1.0));
        }
    }

    #[test]
    fn test_sampling_only_returns_valid_directions() {
        let layout = Layout::parse(
            "
            S#.
            H~#
            ...
            ",
        )
        .unwrap();
        let dist = SlipDistribution::for_cell(&layout.grid, Position::new(1, 1));
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; ACTION_COUNT];
        for _ in 0..10_000 {
            let action = dist.sample(&mut rng).unwrap();
            counts[action.index()] += 1;
        }
        assert_eq!(counts[Action::Up.index()], 0);
        assert_eq!(counts[Action::Right.index()], 0);
        // hazard on the left takes 60%, the single other exit 40%
        assert!((5700..6300).contains(&counts[Action::Left.index()]));
        assert!((3700..4300).contains(&counts[Action::Down.index()]));
    }
}
