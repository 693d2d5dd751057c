//! Combat system: enemies, action resolution, lifecycle.

#![allow(unused_imports)]

pub mod actions;
pub mod enemy;
pub mod events;
pub mod lifecycle;

pub use actions::*;
pub use enemy::*;
pub use events::*;
pub use lifecycle::*;
