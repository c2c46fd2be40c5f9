//! Game-master console core: shared abstractions.
//!
//! This crate defines the traits and types that the dice, session and server
//! crates all depend on. It contains no I/O.

pub mod clock;
pub mod command;
pub mod error;
pub mod rng;
