use super::{Step, candidate_steps};
use crate::{grid::Grid, types::Position};

/// The neighbour move that maximizes Manhattan distance from `threat`.
///
/// Only a strict improvement over the current distance counts; the earliest
/// move in action order wins ties. `None` means stay put.
pub fn flee_step(grid: &Grid, from: Position, threat: Position) -> Option<Step> {
    let mut best_distance = from.manhattan(threat);
    let mut best = None;
    for step in candidate_steps(grid, from) {
        let distance = step.landed.manhattan(threat);
        if distance > best_distance {
            best_distance = distance;
            best = Some(step);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Layout;

    #[test]
    fn test_single_escape_route_is_taken() {
        let layout = Layout::parse(
            "
            ..#.
            S#..
            ....
            ....
            ",
        )
        .unwrap();
        // cornered at (0,0) with the agent directly below
        let step = flee_step(&layout.grid, Position::new(0, 0), Position::new(0, 1)).unwrap();
        assert_eq!(step.landed, Position::new(1, 0));
    }

    #[test]
    fn test_flee_picks_the_farthest_neighbour() {
        let layout = Layout::open_field(5, Position::new(0, 0), Position::new(4, 4)).unwrap();
        let step = flee_step(&layout.grid, Position::new(2, 2), Position::new(1, 2)).unwrap();
        // up, right and down all gain one; up comes first
        assert_eq!(step.landed, Position::new(2, 1));
    }

    #[test]
    fn test_cornered_adversary_stays() {
        let layout = Layout::open_field(3, Position::new(0, 0), Position::new(2, 2)).unwrap();
        assert!(flee_step(&layout.grid, Position::new(2, 2), Position::new(0, 0)).is_none());
    }
}
