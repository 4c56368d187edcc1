//! Dense integer encoding of (position, objective flags).

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    grid::{CellType, Grid},
    types::{Position, StateId},
};

/// Objective progress carried in the state id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    pub const PICKUP_A: u8 = 1;
    pub const PICKUP_B: u8 = 2;
    pub const UNLOCKED: u8 = 4;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit == bit
    }

    pub fn insert(&mut self, bit: u8) {
        self.0 |= bit;
    }

    pub fn has_a(self) -> bool {
        self.contains(Self::PICKUP_A)
    }

    pub fn has_b(self) -> bool {
        self.contains(Self::PICKUP_B)
    }

    pub fn unlocked(self) -> bool {
        self.contains(Self::UNLOCKED)
    }
}

/// `state = x + y * size + flags * size * size`.
///
/// Only as many flag bits as the layout's objectives need are used, so a
/// plain field has exactly `size * size` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpace {
    size: usize,
    flag_bits: u32,
}

impl StateSpace {
    pub fn new(size: usize, flag_bits: u32) -> Self {
        Self {
            size,
            flag_bits: flag_bits.min(3),
        }
    }

    /// Size the flag space from the objectives present on `grid`.
    pub fn for_grid(grid: &Grid) -> Self {
        let flag_bits = if grid.find(CellType::GoalLocked).is_some() {
            3
        } else if grid.find(CellType::PickupB).is_some() {
            2
        } else if grid.find(CellType::PickupA).is_some() {
            1
        } else {
            0
        };
        Self::new(grid.size(), flag_bits)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn position_count(&self) -> usize {
        self.size * self.size
    }

    pub fn flag_combinations(&self) -> usize {
        1 << self.flag_bits
    }

    pub fn state_count(&self) -> usize {
        self.position_count() * self.flag_combinations()
    }

    /// Encode a position with its flags. Flag bits beyond the space are dropped.
    pub fn encode(&self, pos: Position, flags: Flags) -> StateId {
        let mask = (self.flag_combinations() - 1) as u8;
        let bits = (flags.bits() & mask) as usize;
        pos.x as usize + pos.y as usize * self.size + bits * self.position_count()
    }

    pub fn decode(&self, state: StateId) -> Result<(Position, Flags)> {
        if state >= self.state_count() {
            return Err(Error::StateOutOfRange {
                state,
                size: self.state_count(),
            });
        }
        let cells = self.position_count();
        let cell = state % cells;
        let flags = Flags::from_bits((state / cells) as u8);
        let pos = Position::new((cell % self.size) as i32, (cell / self.size) as i32);
        Ok((pos, flags))
    }
}
