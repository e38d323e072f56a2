mod buffer_view;
mod dialog;
mod message_line;
mod session_picker;
mod status_summary;
mod terminal_pane;
pub mod theme;

pub use buffer_view::BufferView;
pub use dialog::{DialogFrame, InstructionBar};
pub use message_line::MessageLine;
pub use session_picker::{SessionPicker, SessionPickerState};
pub use status_summary::{styled_line, StatusSummary};
pub use terminal_pane::TerminalPane;
