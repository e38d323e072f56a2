//! Shared test utilities
//!
//! - Decks wired to the fake host, with draft helpers
//! - TUI rendering helpers

pub mod fixtures;
pub mod terminal;
