//! Actions that keystrokes resolve to
//!
//! Each action is one atomic operation on the deck or on the front-end's own
//! state; the key map produces them and the app applies them.

use crate::lifecycle::SpawnVariant;

/// Edits applied to the composer's current draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Insert(char),
    InsertText(String),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ========== Sessions ==========
    Spawn(SpawnVariant),
    /// Focus the scoped session with this number
    Focus(usize),
    /// Kill the scoped session with this number
    Kill(usize),
    /// Bytes for the focused terminal
    Forward(Vec<u8>),

    // ========== Composer ==========
    ToggleComposer,
    CloseComposer,
    NewTab,
    NextTab,
    PrevTab,
    DeleteTab,
    /// Switch to insert mode, optionally one column to the right
    EnterInsert { append: bool },
    LeaveInsert,
    Edit(EditOp),
    /// Start sending the current draft
    SendDraft,

    // ========== Picker ==========
    PickerUp,
    PickerDown,
    PickerNumber(usize),
    PickerConfirm,
    PickerCancel,

    // ========== Global ==========
    ToggleStatus,
    DebugDump,
    Quit,
}
