//! HTTP routes.

pub mod attack;
pub mod char;
pub mod health;
pub mod view;
pub mod ws;
