//! Ports (trait boundaries) between the training loop and its collaborators.
//!
//! Following hexagonal architecture, these traits are owned by the core and
//! implemented by the solvers and observers around it.

pub mod learner;
pub mod observer;

pub use learner::{Learner, Transition};
pub use observer::Observer;
