//! Inertia - Party Combat Engine Library
//!
//! A turn/real-time-hybrid text RPG combat engine: an ATB-style readiness
//! scheduler, move-table-driven enemy behavior, formula-driven action
//! resolution, and victory/defeat/XP lifecycle. This module exposes the
//! game logic for testing and external use.

// Allow dead code in library - some functions are only used by the binary
#![allow(dead_code)]

pub mod build_info;
pub mod character;
pub mod combat;
pub mod content;
pub mod core;
pub mod save;

pub use crate::core::game_state::GameState;
