//! Game-master console session engine.
//!
//! Owns everything the operator can change during a game: the character
//! roster, places and scenes, initiative and combat, plus the command table
//! that maps operator input onto those changes and the renderer that turns
//! the result into a payload for spectators.

pub mod application;
pub mod domain;

#[cfg(test)]
pub(crate) mod fixtures;
