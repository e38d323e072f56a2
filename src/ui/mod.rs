pub mod action;
pub mod app;
pub mod components;
mod editor;
pub mod input;
pub mod terminal_guard;

pub use action::{Action, EditOp};
pub use app::App;
pub use input::{key_to_bytes, Focus, InputMode, KeyMap};
