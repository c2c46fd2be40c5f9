//! Game-master console dice.
//!
//! Parses dice expressions such as `1d20+5` and resolves them through a
//! [`DiceOracle`]. Two oracles are provided: a local one backed by a
//! [`DeterministicRng`](gmconsole_core::rng::DeterministicRng), and a remote
//! one drawing from a pool of true-random fractions fetched from random.org.
//! Neither oracle ever fails a roll: a broken backend degrades to `0`.

pub mod error;
pub mod expr;
pub mod oracle;
pub mod remote;

pub use error::DiceError;
pub use expr::DiceExpr;
pub use oracle::{DiceOracle, LocalOracle};
