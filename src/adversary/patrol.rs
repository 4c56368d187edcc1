use super::{AdversaryState, Step, can_enter};
use crate::{grid::Grid, types::Position};

/// One patrol turn.
///
/// While waiting the adversary stays put. Otherwise it takes a single-axis
/// step toward the next waypoint, x first until aligned. Reaching the
/// waypoint, or being blocked, counts as arrival: the patrol index advances
/// and the wait counter restarts. Patrols do not use teleporters.
pub fn patrol_step(
    grid: &Grid,
    state: &mut AdversaryState,
    waypoints: &[Position],
    wait_turns: u32,
) -> Option<Step> {
    if waypoints.is_empty() {
        return None;
    }
    if state.wait > 0 {
        state.wait -= 1;
        return None;
    }

    let target = waypoints[(state.patrol_index + 1) % waypoints.len()];
    let from = state.position;
    let candidate = if from.x != target.x {
        Position::new(from.x + (target.x - from.x).signum(), from.y)
    } else {
        Position::new(from.x, from.y + (target.y - from.y).signum())
    };

    let step = (candidate != from && can_enter(grid, candidate)).then_some(Step {
        stepped: candidate,
        landed: candidate,
    });
    let position = step.map_or(from, |s| s.landed);
    if position == target || step.is_none() {
        state.patrol_index = (state.patrol_index + 1) % waypoints.len();
        state.wait = wait_turns;
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Layout;

    #[test]
    fn test_patrol_walks_then_waits_at_each_waypoint() {
        let layout = Layout::open_field(5, Position::new(4, 4), Position::new(4, 3)).unwrap();
        let waypoints = [
            Position::new(0, 0),
            Position::new(2, 0),
            Position::new(2, 2),
        ];
        let mut state = AdversaryState::new(waypoints[0]);

        let mut trail = Vec::new();
        for _ in 0..8 {
            if let Some(step) = patrol_step(&layout.grid, &mut state, &waypoints, 2) {
                state.position = step.landed;
            }
            trail.push(state.position);
        }
        assert_eq!(
            trail,
            vec![
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(2, 0),
                Position::new(2, 0),
                Position::new(2, 1),
                Position::new(2, 2),
                Position::new(2, 2),
                Position::new(2, 2),
            ]
        );
        assert_eq!(state.patrol_index, 2);
    }

    #[test]
    fn test_blocked_patrol_advances_to_the_next_waypoint() {
        let layout = Layout::parse(
            "
            S#.
            ...
            ...
            ",
        )
        .unwrap();
        let waypoints = [
            Position::new(0, 0),
            Position::new(2, 0),
            Position::new(0, 2),
        ];
        let mut state = AdversaryState::new(waypoints[0]);
        assert_eq!(patrol_step(&layout.grid, &mut state, &waypoints, 0), None);
        assert_eq!(state.patrol_index, 1);
        // heading for (0,2) now
        let step = patrol_step(&layout.grid, &mut state, &waypoints, 0).unwrap();
        assert_eq!(step.landed, Position::new(0, 1));
    }
}
