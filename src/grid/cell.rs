//! Cell-type tags

use serde::{Deserialize, Serialize};

/// The tag stored in every grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    #[default]
    Empty,
    Wall,
    Hazard,
    Slip,
    PickupA,
    PickupB,
    GoalLocked,
    GoalOpen,
    TeleportIn,
    TeleportOut,
    Freeze,
}

impl CellType {
    pub fn to_char(self) -> char {
        match self {
            CellType::Empty => '.',
            CellType::Wall => '#',
            CellType::Hazard => 'H',
            CellType::Slip => '~',
            CellType::PickupA => 'a',
            CellType::PickupB => 'b',
            CellType::GoalLocked => 'L',
            CellType::GoalOpen => 'G',
            CellType::TeleportIn => 'T',
            CellType::TeleportOut => 't',
            CellType::Freeze => 'F',
        }
    }

    pub fn from_char(c: char) -> Option<CellType> {
        match c {
            '.' | ' ' => Some(CellType::Empty),
            '#' => Some(CellType::Wall),
            'H' => Some(CellType::Hazard),
            '~' => Some(CellType::Slip),
            'a' => Some(CellType::PickupA),
            'b' => Some(CellType::PickupB),
            'L' => Some(CellType::GoalLocked),
            'G' => Some(CellType::GoalOpen),
            'T' => Some(CellType::TeleportIn),
            't' => Some(CellType::TeleportOut),
            'F' => Some(CellType::Freeze),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_roundtrip_for_every_tag() {
        let all = [
            CellType::Empty,
            CellType::Wall,
            CellType::Hazard,
            CellType::Slip,
            CellType::PickupA,
            CellType::PickupB,
            CellType::GoalLocked,
            CellType::GoalOpen,
            CellType::TeleportIn,
            CellType::TeleportOut,
            CellType::Freeze,
        ];
        for cell in all {
            assert_eq!(CellType::from_char(cell.to_char()), Some(cell));
        }
        assert_eq!(CellType::from_char('?'), None);
    }
}
