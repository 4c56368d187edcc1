//! Core value types shared by the grid, the environment and the solvers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense, zero-based state index produced by [`crate::env::StateSpace`].
pub type StateId = usize;

/// Constants shared across modules.
pub mod constants {
    /// Number of actions in the fixed action set.
    pub const ACTION_COUNT: usize = 4;
    /// Default tolerance for the near-optimal action set in policy improvement.
    pub const POLICY_TOLERANCE: f64 = 1e-5;
}

/// A cell coordinate. `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell reached by moving one step in `action`'s direction (unchecked).
    pub fn step(self, action: Action) -> Self {
        let (dx, dy) = action.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four von Neumann neighbours in exit-probe order: below, above, right, left.
    pub fn probe_ring(self) -> [Position; 4] {
        [
            Self::new(self.x, self.y + 1),
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x - 1, self.y),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// One of the four movement directions. The discriminant is the action index
/// used by Q-table columns and policy vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    /// All actions in index order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Right => (1, 0),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Action::Up => '↑',
            Action::Right => '→',
            Action::Down => '↓',
            Action::Left => '←',
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = crate::Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Action::ALL
            .get(index)
            .copied()
            .ok_or(crate::Error::InvalidAction { index })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "up",
            Action::Right => "right",
            Action::Down => "down",
            Action::Left => "left",
        };
        f.write_str(name)
    }
}

/// Validity flags for the four actions, indexed like [`Action::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionMask([bool; 4]);

impl ActionMask {
    pub const ALL: ActionMask = ActionMask([true; 4]);

    pub fn new(flags: [bool; 4]) -> Self {
        Self(flags)
    }

    pub fn allows(&self, action: Action) -> bool {
        self.0[action.index()]
    }

    pub fn set(&mut self, action: Action, valid: bool) {
        self.0[action.index()] = valid;
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&valid| valid)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&valid| valid).count()
    }

    /// Valid actions in index order.
    pub fn actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&action| self.allows(action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_order_matches_deltas() {
        assert_eq!(Action::Up.delta(), (0, -1));
        assert_eq!(Action::Right.delta(), (1, 0));
        assert_eq!(Action::Down.delta(), (0, 1));
        assert_eq!(Action::Left.delta(), (-1, 0));
        for (index, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), index);
        }
    }

    #[test]
    fn test_action_index_out_of_range_fails() {
        assert_eq!(Action::try_from(2).unwrap(), Action::Down);
        assert!(matches!(
            Action::try_from(4),
            Err(crate::Error::InvalidAction { index: 4 })
        ));
    }

    #[test]
    fn test_mask_lists_valid_actions() {
        let mask = ActionMask::new([false, true, true, false]);
        assert_eq!(mask.actions(), vec![Action::Right, Action::Down]);
        assert_eq!(mask.count(), 2);
        assert!(!mask.is_empty());
        assert!(ActionMask::default().is_empty());
    }

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(Position::new(0, 0).manhattan(Position::new(9, 9)), 18);
        assert_eq!(Position::new(3, 1).manhattan(Position::new(1, 4)), 5);
    }
}
