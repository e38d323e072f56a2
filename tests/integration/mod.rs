//! Integration tests for sessiondeck
//!
//! These drive a deck against the fake host the way the terminal front-end
//! would, plus the binary's command line.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod deck_flow;
pub mod render;
