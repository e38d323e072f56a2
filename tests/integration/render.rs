//! Widgets rendering deck state the way the terminal front-end draws it

use super::common::fixtures::{deck_in, write_draft};
use super::common::terminal::{buffer_contains, rows, test_terminal};
use ratatui::layout::Rect;
use ratatui::style::Style;
use sessiondeck::host::{Buffers, Surfaces};
use sessiondeck::picker::PickerMenu;
use sessiondeck::ui::components::{BufferView, SessionPicker, SessionPickerState, StatusSummary};

#[test]
fn test_status_summary_from_deck() {
    let mut deck = deck_in("/proj");
    deck.spawn("fresh").unwrap();
    deck.spawn("fresh").unwrap();

    let buffer = deck.state().status_buffer.unwrap();
    let lines = deck.host().lines(buffer).unwrap();
    let regions = deck.host().styles(buffer);

    let mut terminal = test_terminal(40, 1);
    terminal
        .draw(|f| f.render_widget(StatusSummary::new(&lines[0], &regions), f.area()))
        .unwrap();

    let row = &rows(terminal.backend().buffer())[0];
    assert!(row.contains("● 1"));
    assert!(row.contains(" ● 2 "));
}

#[test]
fn test_composer_surface_shows_title_and_draft() {
    let mut deck = deck_in("/proj");
    write_draft(&mut deck, "first line\nsecond line");
    deck.new_tab().unwrap();
    deck.prev_tab().unwrap();

    let surface = deck.state().prompt_surface.unwrap();
    let config = deck.host().surface_config(surface).unwrap();
    let buffer = deck.host().surface_buffer(surface).unwrap();
    let lines = deck.host().lines(buffer).unwrap();

    let mut terminal = test_terminal(120, 40);
    terminal
        .draw(|f| {
            let rect = Rect::new(config.col, config.row, config.width, config.height);
            let view = BufferView::new(&lines)
                .title(config.title.as_deref())
                .border(Style::default());
            f.render_widget(view, rect);
        })
        .unwrap();

    let screen = terminal.backend().buffer();
    assert!(buffer_contains(screen, "[prompt-1]"));
    assert!(buffer_contains(screen, "prompt-2"));
    assert!(buffer_contains(screen, "second line"));
}

#[test]
fn test_picker_dialog_lists_sessions_then_spawns() {
    let mut deck = deck_in("/proj");
    deck.spawn("resume").unwrap();
    let state = SessionPickerState::new(PickerMenu::build(deck.scoped_sessions(), None));

    let mut terminal = test_terminal(80, 20);
    terminal
        .draw(|f| SessionPicker::render(f.area(), f.buffer_mut(), &state))
        .unwrap();

    let screen = terminal.backend().buffer();
    assert!(buffer_contains(screen, "▶ 1. blue (resume) · just now"));
    assert!(buffer_contains(screen, "+ New session"));
    assert!(buffer_contains(screen, "Esc cancel"));
}
