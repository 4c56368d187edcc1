//! Grid storage, neighbourhood queries and text layouts

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cell::CellType;
use crate::{
    Error, Result,
    types::{Action, ActionMask, Position},
};

/// A walkable cell adjacent to some position, tagged with the action that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub action: Action,
    pub position: Position,
}

/// Fixed-size square grid of cell tags.
///
/// Walls are fixed once the grid is handed to an environment. The only
/// mutations after that point are one-shot effects: consuming a pickup or a
/// freeze tile and revealing the hidden goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<CellType>,
    /// (mouth, intended exit) for every teleporter mouth
    teleports: Vec<(Position, Position)>,
    hidden_goal: Option<Position>,
}

impl Grid {
    /// Create an all-empty `size` x `size` grid.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfiguration {
                message: "grid size must be at least 1".to_string(),
            });
        }
        Ok(Self {
            size,
            cells: vec![CellType::Empty; size * size],
            teleports: Vec::new(),
            hidden_goal: None,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.size && (pos.y as usize) < self.size
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.x as usize + pos.y as usize * self.size)
    }

    fn require(&self, pos: Position) -> Result<usize> {
        self.index(pos).ok_or(Error::PositionOutOfBounds {
            position: pos,
            size: self.size,
        })
    }

    /// Cell tag at `pos`. Anything outside the grid reads as a wall.
    pub fn cell_type(&self, pos: Position) -> CellType {
        self.index(pos)
            .map_or(CellType::Wall, |index| self.cells[index])
    }

    pub fn set(&mut self, pos: Position, cell: CellType) -> Result<()> {
        let index = self.require(pos)?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Place `cell` at every position in `positions`.
    pub fn fill(&mut self, positions: &[Position], cell: CellType) -> Result<()> {
        for &pos in positions {
            self.set(pos, cell)?;
        }
        Ok(())
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.contains(pos) && self.cell_type(pos) != CellType::Wall
    }

    /// The (at most four) walkable neighbours of `pos`, in action order.
    pub fn neighbors(&self, pos: Position) -> Vec<Neighbor> {
        Action::ALL
            .into_iter()
            .map(|action| Neighbor {
                action,
                position: pos.step(action),
            })
            .filter(|neighbor| self.is_walkable(neighbor.position))
            .collect()
    }

    pub fn valid_actions(&self, pos: Position) -> ActionMask {
        let mut mask = ActionMask::default();
        for neighbor in self.neighbors(pos) {
            mask.set(neighbor.action, true);
        }
        mask
    }

    /// Link two mouths so that entering either one lands on the other.
    pub fn link_teleporters(&mut self, entry: Position, partner: Position) -> Result<()> {
        self.link_teleporters_with_exits(entry, partner, partner, entry)
    }

    /// Link two mouths with explicit landing cells: entering `entry` lands on
    /// `entry_exit`, entering `partner` lands on `partner_exit`.
    pub fn link_teleporters_with_exits(
        &mut self,
        entry: Position,
        entry_exit: Position,
        partner: Position,
        partner_exit: Position,
    ) -> Result<()> {
        self.require(entry_exit)?;
        self.require(partner_exit)?;
        self.set(entry, CellType::TeleportIn)?;
        self.set(partner, CellType::TeleportOut)?;
        self.teleports
            .retain(|(mouth, _)| *mouth != entry && *mouth != partner);
        self.teleports.push((entry, entry_exit));
        self.teleports.push((partner, partner_exit));
        Ok(())
    }

    /// Where an agent entering `pos` ends up, if `pos` is a teleporter mouth.
    ///
    /// An exit that lands on a wall is moved to the first walkable von Neumann
    /// neighbour of the intended exit (probe order below, above, right, left).
    /// If none is walkable the mouth itself is returned.
    pub fn teleport_exit(&self, pos: Position) -> Option<Position> {
        let (_, exit) = self.teleports.iter().find(|(mouth, _)| *mouth == pos)?;
        if self.is_walkable(*exit) {
            return Some(*exit);
        }
        Some(
            exit.probe_ring()
                .into_iter()
                .find(|&candidate| self.is_walkable(candidate))
                .unwrap_or(pos),
        )
    }

    /// Resolve a teleporter landing, or return `pos` unchanged.
    pub fn warp(&self, pos: Position) -> Position {
        self.teleport_exit(pos).unwrap_or(pos)
    }

    /// Register a goal tile that stays hidden until [`Grid::reveal_goal`].
    pub fn hide_goal(&mut self, pos: Position) -> Result<()> {
        let index = self.require(pos)?;
        if self.cells[index] == CellType::Wall {
            return Err(Error::WallConflict {
                what: "goal",
                position: pos,
            });
        }
        self.cells[index] = CellType::Empty;
        self.hidden_goal = Some(pos);
        Ok(())
    }

    pub fn hidden_goal(&self) -> Option<Position> {
        self.hidden_goal
    }

    /// Turn the hidden goal (if any) into an open goal tile.
    pub fn reveal_goal(&mut self) {
        if let Some(index) = self.hidden_goal.and_then(|pos| self.index(pos)) {
            self.cells[index] = CellType::GoalOpen;
        }
    }

    /// One-shot removal of a pickup or freeze tile. Walls are left alone.
    pub fn consume(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            if self.cells[index] != CellType::Wall {
                self.cells[index] = CellType::Empty;
            }
        }
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |y| {
            (0..self.size).map(move |x| Position::new(x as i32, y as i32))
        })
    }

    pub fn positions_of(&self, cell: CellType) -> Vec<Position> {
        self.positions()
            .filter(|&pos| self.cell_type(pos) == cell)
            .collect()
    }

    pub fn find(&self, cell: CellType) -> Option<Position> {
        self.positions().find(|&pos| self.cell_type(pos) == cell)
    }

    /// Where the goal is or will be once revealed.
    pub fn goal_position(&self) -> Option<Position> {
        self.find(CellType::GoalOpen).or(self.hidden_goal)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size) {
            let line: String = row.iter().map(|cell| cell.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A grid together with the start positions of the agent and the adversary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub grid: Grid,
    pub start: Position,
    pub adversary_start: Option<Position>,
}

impl Layout {
    /// Parse a square text layout.
    ///
    /// Besides the [`CellType`] glyphs three markers are understood: `S` is the
    /// agent start, `A` the adversary start and `E` a goal hidden until the
    /// barrier opens. Marker cells are empty. A single `T`/`t` pair is linked
    /// automatically; layouts with more mouths link them explicitly.
    pub fn parse(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let size = rows.len();
        let mut grid = Grid::new(size)?;
        let mut start = None;
        let mut adversary_start = None;

        for (y, row) in rows.iter().enumerate() {
            let width = row.chars().count();
            if width != size {
                return Err(Error::InvalidLayoutShape {
                    row: y,
                    got: width,
                    expected: size,
                });
            }
            for (x, character) in row.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                match character {
                    'S' => start = Some(pos),
                    'A' => adversary_start = Some(pos),
                    'E' => grid.hide_goal(pos)?,
                    other => {
                        let cell =
                            CellType::from_char(other).ok_or(Error::InvalidLayoutCharacter {
                                character: other,
                                row: y,
                                column: x,
                            })?;
                        grid.set(pos, cell)?;
                    }
                }
            }
        }

        let entries = grid.positions_of(CellType::TeleportIn);
        let exits = grid.positions_of(CellType::TeleportOut);
        if let ([entry], [exit]) = (entries.as_slice(), exits.as_slice()) {
            grid.link_teleporters(*entry, *exit)?;
        }

        let start = start.ok_or_else(|| Error::InvalidConfiguration {
            message: "layout has no start marker 'S'".to_string(),
        })?;

        Ok(Self {
            grid,
            start,
            adversary_start,
        })
    }

    /// An open `size` x `size` field with a single goal tile.
    pub fn open_field(size: usize, start: Position, goal: Position) -> Result<Self> {
        let mut grid = Grid::new(size)?;
        if !grid.contains(start) {
            return Err(Error::PositionOutOfBounds {
                position: start,
                size,
            });
        }
        grid.set(goal, CellType::GoalOpen)?;
        Ok(Self {
            grid,
            start,
            adversary_start: None,
        })
    }
}
