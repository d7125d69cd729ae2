//! Headless scenario runner for the OpenFields combat core.
//!
//! Loads weapon/character data, builds a [`of_core::game_state::GameState`],
//! feeds it scripted commands, and reports the outcome. Used for CI
//! verification, balance sweeps, and seed-replay debugging.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod runner;
pub mod scenario;
