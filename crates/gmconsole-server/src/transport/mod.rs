//! Line-oriented command transports.

pub mod console;
pub mod telnet;
