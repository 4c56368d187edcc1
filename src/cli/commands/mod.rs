//! Subcommands of the `gridmdp` binary

pub mod evaluate;
pub mod solve;
pub mod train;
