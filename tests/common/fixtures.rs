//! Deck fixtures backed by the fake host

use std::path::PathBuf;

use sessiondeck::host::fake::FakeHost;
use sessiondeck::host::{Buffers, Level};
use sessiondeck::{Config, Deck};

pub fn deck_in(cwd: &str) -> Deck<FakeHost> {
    Deck::new(FakeHost::new(), Config::default(), PathBuf::from(cwd))
}

/// Open the composer and replace the current draft with `text`
pub fn write_draft(deck: &mut Deck<FakeHost>, text: &str) {
    if !deck.composer_open() {
        deck.open_composer().expect("composer opens");
    }
    let buffer = deck
        .state()
        .prompt
        .current()
        .expect("composer has a tab")
        .buffer;
    deck.host_mut()
        .set_lines(buffer, text.split('\n').map(str::to_string).collect())
        .expect("draft buffer exists");
}

/// Notifications sent at `level`
pub fn notifications(deck: &Deck<FakeHost>, level: Level) -> Vec<String> {
    deck.host()
        .notifications()
        .iter()
        .filter(|(l, _)| *l == level)
        .map(|(_, text)| text.clone())
        .collect()
}
