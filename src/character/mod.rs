//! Party members: stats, status effects, leveling.

#![allow(unused_imports)]

pub mod party;
pub mod stats;
pub mod status;

pub use party::*;
pub use stats::*;
pub use status::*;
