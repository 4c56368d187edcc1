//! Ordered objectives of a layout and the flag transitions they drive.

use super::state::Flags;
use crate::{
    grid::{CellType, Grid},
    types::Position,
};

/// Flag change caused by entering a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Pickup(CellType),
    Unlock,
}

impl Milestone {
    pub fn bit(self) -> u8 {
        match self {
            Milestone::Pickup(CellType::PickupB) => Flags::PICKUP_B,
            Milestone::Pickup(_) => Flags::PICKUP_A,
            Milestone::Unlock => Flags::UNLOCKED,
        }
    }
}

/// Where the objectives of a pristine layout sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Objectives {
    pub pickup_a: Option<Position>,
    pub pickup_b: Option<Position>,
    pub barrier: Option<Position>,
    pub goal: Option<Position>,
}

impl Objectives {
    pub fn scan(grid: &Grid) -> Self {
        Self {
            pickup_a: grid.find(CellType::PickupA),
            pickup_b: grid.find(CellType::PickupB),
            barrier: grid.find(CellType::GoalLocked),
            goal: grid.goal_position(),
        }
    }

    pub fn all_collected(&self, flags: Flags) -> bool {
        (self.pickup_a.is_none() || flags.has_a()) && (self.pickup_b.is_none() || flags.has_b())
    }

    /// Whether arriving on the goal ends the episode.
    pub fn goal_open(&self, flags: Flags) -> bool {
        self.barrier.is_none() || flags.unlocked()
    }

    pub fn final_phase(&self, flags: Flags) -> bool {
        self.all_collected(flags) && self.goal_open(flags)
    }

    /// Next objective: pickup A, pickup B, the barrier, then the goal.
    pub fn sub_goal(&self, flags: Flags) -> Option<Position> {
        match (self.pickup_a, self.pickup_b, self.barrier) {
            (Some(a), _, _) if !flags.has_a() => Some(a),
            (_, Some(b), _) if !flags.has_b() => Some(b),
            (_, _, Some(barrier)) if !flags.unlocked() => Some(barrier),
            _ => self.goal,
        }
    }

    /// The milestone reached by entering a `cell` tile with `flags`, if any.
    /// Pickup B needs A first; the barrier needs every pickup.
    pub fn enter(&self, cell: CellType, flags: Flags) -> Option<Milestone> {
        match cell {
            CellType::PickupA if !flags.has_a() => Some(Milestone::Pickup(cell)),
            CellType::PickupB if flags.has_a() && !flags.has_b() => Some(Milestone::Pickup(cell)),
            CellType::GoalLocked if !flags.unlocked() && self.all_collected(flags) => {
                Some(Milestone::Unlock)
            }
            _ => None,
        }
    }
}
