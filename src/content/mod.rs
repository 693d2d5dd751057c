//! Static content tables and their typed, load-time-compiled form.

#![allow(unused_imports)]

pub mod db;
pub mod types;

pub use db::*;
pub use types::*;
