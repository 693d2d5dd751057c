//! Core engine state, constants, formulas, and the tick loop.

#![allow(unused_imports)]

pub mod constants;
pub mod formula;
pub mod game_state;
pub mod tick;

pub use constants::*;
pub use formula::*;
pub use game_state::*;
pub use tick::*;
