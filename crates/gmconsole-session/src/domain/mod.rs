//! Session state and the rules that guard it.

pub mod character;
pub mod content;
pub mod roster;
pub mod tables;
pub mod turn_order;
pub mod world;
