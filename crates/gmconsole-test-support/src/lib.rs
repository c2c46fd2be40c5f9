//! Shared test doubles for the game-master console crates.

mod clock;
mod rng;

pub use clock::{FixedClock, fixed_clock};
pub use rng::{CyclingRng, MockRng, SequenceRng};
