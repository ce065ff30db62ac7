//! swap-state
//!
//! The persistent state database (sled-backed, §4.9) and the state
//! transition engine (C2/C3/C5/C6/C7) that validates and applies `Action`s
//! against it.

pub mod db;
pub mod engine;

pub use db::StateDb;
pub use engine::{ActionOutcome, SwapEngine};
