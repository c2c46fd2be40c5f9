//! Operations driven by operator commands and the auto-fight scheduler.

pub mod autofight;
pub mod combat;
pub mod handlers;
pub mod interpreter;
pub mod render;
pub mod session;
