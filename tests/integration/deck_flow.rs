//! End-to-end flows through the deck: spawning, sending drafts through the
//! picker, killing, and reacting to process exits.

use super::common::fixtures::{deck_in, notifications, write_draft};
use sessiondeck::deck::{BRACKETED_PASTE_END, BRACKETED_PASTE_START};
use sessiondeck::host::fake::FakeHost;
use sessiondeck::host::{Buffers, Level, Surfaces};
use sessiondeck::picker::PickerEntry;
use sessiondeck::{Config, Deck, DeckError, SpawnVariant};
use std::path::{Path, PathBuf};

#[test]
fn test_spawn_send_and_exit() {
    let mut deck = deck_in("/proj");

    let session = deck.spawn("fresh").unwrap();
    assert_eq!(deck.state().registry.count_all(), 1);
    assert_eq!(session.color.get(), 1);
    assert_eq!(deck.state().registry.count_scoped(Path::new("/proj")), 1);
    assert!(deck.status_shown());

    write_draft(&mut deck, "explain this module");
    let menu = deck.send_prompt().unwrap();
    match &menu.entries[0] {
        PickerEntry::Existing(entry) => assert_eq!(entry.session.channel, session.channel),
        other => panic!("expected the session first, got {:?}", other),
    }

    let target = deck.complete_send(&menu, Some(0)).unwrap().unwrap();
    assert_eq!(target.channel, session.channel);
    assert_eq!(deck.host().written(session.channel), "explain this module\r");
    assert!(!deck.composer_open());

    deck.host_mut().exit(session.channel, 0);
    deck.tick();
    assert_eq!(deck.state().registry.count_all(), 0);
    assert!(!deck.status_shown());
    assert!(notifications(&deck, Level::Warn).is_empty());
}

#[test]
fn test_invalid_variant_changes_nothing() {
    let mut deck = deck_in("/proj");
    deck.spawn("fresh").unwrap();

    assert!(matches!(
        deck.spawn("bogus-variant"),
        Err(DeckError::InvalidVariant(_))
    ));
    assert_eq!(deck.state().registry.count_all(), 1);
    assert_eq!(notifications(&deck, Level::Error).len(), 1);
}

#[test]
fn test_missing_executable_is_reported() {
    let config = Config::default();
    let host = FakeHost::new().missing_executable(&config.executable);
    let mut deck = Deck::new(host, config, PathBuf::from("/proj"));

    assert!(matches!(
        deck.spawn("fresh"),
        Err(DeckError::ExecutableNotFound(_))
    ));
    assert_eq!(deck.state().registry.count_all(), 0);
    assert!(!deck.status_shown());
}

#[test]
fn test_picker_puts_last_focused_first() {
    let mut deck = deck_in("/proj");
    let first = deck.spawn("fresh").unwrap();
    let second = deck.spawn("resume").unwrap();
    assert_eq!(deck.state().last_focused, Some(second.channel));

    write_draft(&mut deck, "hi");
    let menu = deck.send_prompt().unwrap();
    let channels: Vec<_> = menu
        .entries
        .iter()
        .filter_map(|e| match e {
            PickerEntry::Existing(entry) => Some(entry.session.channel),
            PickerEntry::Spawn(_) => None,
        })
        .collect();
    assert_eq!(channels, vec![second.channel, first.channel]);

    let spawns: Vec<_> = menu.entries[2..]
        .iter()
        .filter_map(|e| match e {
            PickerEntry::Spawn(variant) => Some(*variant),
            PickerEntry::Existing(_) => None,
        })
        .collect();
    assert_eq!(spawns, SpawnVariant::ALL.to_vec());
}

#[test]
fn test_multiline_draft_uses_bracketed_paste() {
    let mut deck = deck_in("/proj");
    let session = deck.spawn("fresh").unwrap();

    write_draft(&mut deck, "line one\nline two\n\n");
    let menu = deck.send_prompt().unwrap();
    deck.complete_send(&menu, Some(0)).unwrap();

    assert_eq!(
        deck.host().written(session.channel),
        format!(
            "{}line one\nline two{}\r",
            BRACKETED_PASTE_START, BRACKETED_PASTE_END
        )
    );
}

#[test]
fn test_blank_draft_is_refused() {
    let mut deck = deck_in("/proj");
    deck.spawn("fresh").unwrap();

    write_draft(&mut deck, "   \n");
    assert!(matches!(
        deck.send_prompt(),
        Err(DeckError::EmptyComposition)
    ));
    assert!(deck.composer_open());
    assert_eq!(notifications(&deck, Level::Warn).len(), 1);
}

#[test]
fn test_cancelled_picker_keeps_draft() {
    let mut deck = deck_in("/proj");
    let session = deck.spawn("fresh").unwrap();

    write_draft(&mut deck, "keep me");
    let menu = deck.send_prompt().unwrap();
    assert_eq!(deck.complete_send(&menu, None).unwrap(), None);

    assert!(deck.composer_open());
    assert_eq!(deck.host().written(session.channel), "");
    let buffer = deck.state().prompt.current().unwrap().buffer;
    assert_eq!(deck.host().lines(buffer).unwrap(), vec!["keep me"]);
}

#[test]
fn test_send_to_dead_session_unregisters_it() {
    let mut deck = deck_in("/proj");
    let session = deck.spawn("fresh").unwrap();

    write_draft(&mut deck, "hello");
    let menu = deck.send_prompt().unwrap();
    deck.host_mut().terminals_mut().vanish(session.channel);

    assert!(matches!(
        deck.complete_send(&menu, Some(0)),
        Err(DeckError::TerminalGone(ch)) if ch == session.channel
    ));
    assert_eq!(deck.state().registry.count_all(), 0);
    assert!(deck.composer_open());
}

#[test]
fn test_send_through_spawn_entry() {
    let mut deck = deck_in("/proj");
    write_draft(&mut deck, "start here");

    let menu = deck.send_prompt().unwrap();
    assert_eq!(menu.len(), SpawnVariant::ALL.len());

    let session = deck.complete_send(&menu, Some(2)).unwrap().unwrap();
    assert_eq!(session.variant, SpawnVariant::Continue);
    assert_eq!(deck.host().written(session.channel), "start here\r");
    assert_eq!(deck.state().registry.count_all(), 1);
}

#[test]
fn test_kill_renumbers_and_stays_quiet() {
    let mut deck = deck_in("/proj");
    deck.spawn("fresh").unwrap();
    let second = deck.spawn("fresh").unwrap();

    deck.kill_number(1).unwrap();
    deck.tick();

    let scoped = deck.scoped_sessions();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].number, 1);
    assert_eq!(scoped[0].session.channel, second.channel);
    assert!(notifications(&deck, Level::Warn).is_empty());

    assert!(matches!(
        deck.kill_number(2),
        Err(DeckError::InvalidSelector { index: 2, count: 1 })
    ));
}

#[test]
fn test_abnormal_exit_warns() {
    let mut deck = deck_in("/proj");
    let session = deck.spawn("fresh").unwrap();

    deck.host_mut().exit(session.channel, 2);
    deck.tick();

    let warnings = notifications(&deck, Level::Warn);
    assert_eq!(warnings, vec!["blue session (fresh) exited with code 2"]);
    assert_eq!(deck.state().registry.count_all(), 0);
}

#[test]
fn test_buffer_and_exit_signals_both_fire() {
    let mut deck = deck_in("/proj");
    let session = deck.spawn("fresh").unwrap();
    deck.spawn("fresh").unwrap();

    // Deleting the buffer stops the process too; both paths unregister
    deck.host_mut().delete_buffer(session.buffer);
    deck.tick();
    deck.tick();

    assert_eq!(deck.state().registry.count_all(), 1);
    assert!(deck.state().deferred.is_empty());
    assert!(deck
        .state()
        .registry
        .find_by_channel(session.channel)
        .is_none());
}

#[test]
fn test_focus_number_shows_session() {
    let mut deck = deck_in("/proj");
    let first = deck.spawn("fresh").unwrap();
    deck.spawn("fresh").unwrap();

    deck.focus_number(1).unwrap();
    deck.tick();

    let current = deck.host().current_surface();
    assert_eq!(deck.host().surface_buffer(current), Some(first.buffer));
    assert_eq!(deck.state().last_focused, Some(first.channel));
}

#[test]
fn test_deleting_only_tab_leaves_fresh_tab() {
    let mut deck = deck_in("/proj");
    write_draft(&mut deck, "scrap this");

    deck.delete_tab().unwrap();

    let prompt = &deck.state().prompt;
    assert_eq!(prompt.len(), 1);
    let buffer = prompt.current().unwrap().buffer;
    assert_eq!(deck.host().lines(buffer).unwrap(), vec![String::new()]);
    assert!(deck.host().insert_mode());
}

#[test]
fn test_reset_tears_everything_down() {
    let mut deck = deck_in("/proj");
    let session = deck.spawn("fresh").unwrap();
    write_draft(&mut deck, "draft");

    deck.reset();

    assert_eq!(deck.state().registry.count_all(), 0);
    assert!(!deck.composer_open());
    assert!(!deck.status_shown());
    assert_eq!(deck.host().written(session.channel), "");
    assert_eq!(deck.spawn("fresh").unwrap().color.get(), 1);
}
