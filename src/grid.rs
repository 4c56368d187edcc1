//! Grid layouts: cell classification, walkability queries, teleporters and
//! procedurally generated fields.

pub mod cell;
pub mod generation;
pub mod layout;
pub mod presets;

pub use cell::CellType;
pub use generation::{LavaFieldGenerator, reachable};
pub use layout::{Grid, Layout, Neighbor};
