//! Built-in layouts

use rand::rngs::StdRng;

use super::{generation::LavaFieldGenerator, layout::Layout};
use crate::{Result, types::Position};

const ESCAPE_ROOM: &str = "
    S.........
    .##....##.
    .#T.H...#.
    ...#.#....
    ...#L#.Ha.
    ..H#.#....
    ...#.#....
    .#...H.t#.
    .##....##.
    .........E
";

const FREEZE_CHASE: &str = "
    S........A
    ..~.......
    .~F.......
    ....#.....
    ....#.....
    ..#.~....#
    ..##F.~.#.
    .....~....
    .####.....
    .FFFF....G
";

const PELLET_PURSUIT: &str = "
    #####T####
    #S......b#
    #.###.##.#
    #..#..#..#
    #..#..#..#
    T....a...t
    #..#..#..#
    #.###.##.#
    #.......A#
    #####t####
";

/// Waypoints walked by the escape-room guard, in order.
pub const ESCAPE_ROOM_PATROL: [Position; 4] = [
    Position::new(2, 2),
    Position::new(6, 2),
    Position::new(6, 7),
    Position::new(2, 7),
];

/// 10x10 open field, start top-left and goal bottom-right.
pub fn open_field() -> Result<Layout> {
    Layout::open_field(10, Position::new(0, 0), Position::new(9, 9))
}

/// Key, vault and a hidden exit, with quicksand and one teleporter pair.
/// The guard starts on its first patrol waypoint.
pub fn escape_room() -> Result<Layout> {
    let mut layout = Layout::parse(ESCAPE_ROOM)?;
    layout.adversary_start = Some(ESCAPE_ROOM_PATROL[0]);
    Ok(layout)
}

pub fn freeze_chase() -> Result<Layout> {
    Layout::parse(FREEZE_CHASE)
}

/// Maze with wrap-around teleporters on all four borders. Each mouth lands
/// one cell inside the opposite border.
pub fn pellet_pursuit() -> Result<Layout> {
    let mut layout = Layout::parse(PELLET_PURSUIT)?;
    let grid = &mut layout.grid;
    grid.link_teleporters_with_exits(
        Position::new(5, 0),
        Position::new(5, 8),
        Position::new(5, 9),
        Position::new(5, 1),
    )?;
    grid.link_teleporters_with_exits(
        Position::new(0, 5),
        Position::new(8, 5),
        Position::new(9, 5),
        Position::new(1, 5),
    )?;
    Ok(layout)
}

/// A freshly generated lava field (see [`LavaFieldGenerator`]).
pub fn lava_field(rng: &mut StdRng) -> Result<Layout> {
    LavaFieldGenerator::default().generate(rng)
}
