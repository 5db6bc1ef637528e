//! MTG rules engine - legality and priority tracking for a two-player match
//!
//! Tracks the turn structure, priority, mana and card restrictions of a
//! match observed from game events, and answers which actions a player may
//! legally take right now.

pub mod core;
pub mod error;
pub mod game;
pub mod history;
pub mod loader;
pub mod zones;

pub use error::{MtgError, Result};
