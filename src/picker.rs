//! Unified picker
//!
//! Merges "pick an existing session" and "spawn a new one" into one list.
//! Building the menu and resolving a choice are separate steps so the
//! front-end can present the list however it likes; a cancelled selection
//! resolves to `None` with no side effects.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::DeckError;
use crate::host::{ChannelId, Host};
use crate::lifecycle::{Lifecycle, SpawnVariant};
use crate::registry::{Session, SessionEntry};
use crate::util::time::relative_age;

/// One selectable row
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEntry {
    Existing(SessionEntry),
    Spawn(SpawnVariant),
}

impl PickerEntry {
    pub fn label(&self, now: DateTime<Utc>) -> String {
        match self {
            PickerEntry::Existing(entry) => format!(
                "{}. {} ({}) · {}",
                entry.number,
                entry.session.color,
                entry.session.variant,
                relative_age(entry.session.created_at, now)
            ),
            PickerEntry::Spawn(variant) => format!("+ {}", variant.display_name()),
        }
    }
}

/// The outcome of a resolved selection
#[derive(Debug, Clone, PartialEq)]
pub enum Picked {
    /// Spawned for this selection; already shown in the current surface
    Created(Session),
    /// Chosen from the list, with the surface it was showing in
    Existing(SessionEntry),
}

impl Picked {
    pub fn session(&self) -> &Session {
        match self {
            Picked::Created(session) => session,
            Picked::Existing(entry) => &entry.session,
        }
    }
}

/// Ranked list of picker entries
#[derive(Debug, Clone, PartialEq)]
pub struct PickerMenu {
    pub entries: Vec<PickerEntry>,
}

impl PickerMenu {
    /// Scoped sessions first, with `last_focused` promoted to the front,
    /// then one spawn entry per variant in declared order
    pub fn build(mut scoped: Vec<SessionEntry>, last_focused: Option<ChannelId>) -> Self {
        if let Some(index) = last_focused
            .and_then(|ch| scoped.iter().position(|e| e.session.channel == ch))
            .filter(|&i| i > 0)
        {
            let entry = scoped.remove(index);
            scoped.insert(0, entry);
        }

        let entries = scoped
            .into_iter()
            .map(PickerEntry::Existing)
            .chain(SpawnVariant::ALL.into_iter().map(PickerEntry::Spawn))
            .collect();
        Self { entries }
    }

    pub fn labels(&self, now: DateTime<Utc>) -> Vec<String> {
        self.entries.iter().map(|e| e.label(now)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Act on the user's choice from `menu`
///
/// `None` means the selection was cancelled. A spawn entry spawns through
/// `lifecycle`; if that fails the error is returned and nothing is picked.
pub fn resolve<H: Host>(
    menu: &PickerMenu,
    choice: Option<usize>,
    lifecycle: &mut Lifecycle<'_, H>,
) -> Result<Option<Picked>, DeckError> {
    let Some(index) = choice else {
        debug!("picker cancelled");
        return Ok(None);
    };
    let entry = menu.entries.get(index).ok_or(DeckError::InvalidSelector {
        index: index + 1,
        count: menu.len(),
    })?;

    let picked = match entry {
        PickerEntry::Spawn(variant) => Picked::Created(lifecycle.spawn_variant(*variant)?),
        PickerEntry::Existing(entry) => Picked::Existing(entry.clone()),
    };
    Ok(Some(picked))
}
