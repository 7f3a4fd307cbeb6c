// Keyboard input handling and command dispatch.
//
// Most keys mutate `ViewState` directly (focus, cursors, filters, scrolling).
// Reload, export and quit are returned as `UserCommand`s for the app
// orchestrator.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::protocol::UserCommand;
use super::{Focus, ViewState};

/// Slider step for `H`/`L`.
const COARSE_STEP: i64 = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator, `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows emits Press and Release for each keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.search_mode {
        handle_search_mode(key_event, view_state);
        return None;
    }

    match key_event.code {
        KeyCode::Tab => {
            view_state.set_focus(view_state.focus.next());
            None
        }
        KeyCode::BackTab => {
            view_state.set_focus(view_state.focus.prev());
            None
        }

        KeyCode::Up | KeyCode::Char('k') => {
            move_up(view_state, 1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_down(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            move_up(view_state, view_state.page_size);
            None
        }
        KeyCode::PageDown => {
            move_down(view_state, view_state.page_size);
            None
        }
        KeyCode::Home | KeyCode::Char('g') => {
            move_up(view_state, usize::MAX);
            None
        }
        KeyCode::End | KeyCode::Char('G') => {
            move_down(view_state, usize::MAX);
            None
        }

        KeyCode::Left | KeyCode::Char('h') => {
            step(view_state, -1);
            None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            step(view_state, 1);
            None
        }
        KeyCode::Char('H') => {
            step(view_state, -COARSE_STEP);
            None
        }
        KeyCode::Char('L') => {
            step(view_state, COARSE_STEP);
            None
        }
        KeyCode::Char('<') => {
            shift_columns(view_state, -1);
            None
        }
        KeyCode::Char('>') => {
            shift_columns(view_state, 1);
            None
        }

        KeyCode::Char(' ') | KeyCode::Enter => {
            toggle_under_cursor(view_state);
            None
        }

        // Search is only meaningful on an option list.
        KeyCode::Char('/') => {
            if matches!(view_state.focus, Focus::Facet(_)) {
                view_state.search_mode = true;
            }
            None
        }
        KeyCode::Esc => {
            view_state.search_text.clear();
            view_state.status_message = None;
            None
        }

        KeyCode::Char('x') => {
            clear_focused(view_state);
            None
        }
        KeyCode::Char('c') => {
            view_state.session.clear_filters();
            view_state.table_scroll = 0;
            None
        }

        KeyCode::Char('e') => {
            view_state.status_message = Some("Exporting...".to_string());
            Some(UserCommand::Export(Box::new(
                view_state.session.export_request(),
            )))
        }
        KeyCode::Char('r') => Some(UserCommand::Reload { force: false }),
        KeyCode::Char('R') => Some(UserCommand::Reload { force: true }),

        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('q') => Some(UserCommand::Quit),
        KeyCode::Char('n') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn handle_search_mode(key_event: KeyEvent, view_state: &mut ViewState) {
    match key_event.code {
        KeyCode::Esc => {
            view_state.search_mode = false;
            view_state.search_text.clear();
        }
        KeyCode::Enter => {
            view_state.search_mode = false;
        }
        KeyCode::Backspace => {
            view_state.search_text.pop();
        }
        KeyCode::Char(c) => {
            view_state.search_text.push(c);
        }
        _ => return,
    }
    // The visible list changed under the cursor.
    if let Focus::Facet(field) = view_state.focus {
        view_state.facet_cursor.insert(field, 0);
    }
}

// ---------------------------------------------------------------------------
// Navigation helpers
// ---------------------------------------------------------------------------

fn move_up(view_state: &mut ViewState, n: usize) {
    match view_state.focus {
        Focus::Facet(field) => {
            let cursor = view_state.cursor(field).saturating_sub(n);
            view_state.facet_cursor.insert(field, cursor);
        }
        Focus::Table => {
            view_state.table_scroll = view_state.table_scroll.saturating_sub(n);
        }
        Focus::Threshold(_) => {}
    }
}

fn move_down(view_state: &mut ViewState, n: usize) {
    match view_state.focus {
        Focus::Facet(field) => {
            let last = view_state.visible_options(field).len().saturating_sub(1);
            let cursor = view_state.cursor(field).saturating_add(n).min(last);
            view_state.facet_cursor.insert(field, cursor);
        }
        Focus::Table => {
            let last = view_state.session.presentation().len().saturating_sub(1);
            view_state.table_scroll = view_state.table_scroll.saturating_add(n).min(last);
        }
        Focus::Threshold(_) => {}
    }
}

/// Left/right: nudge a threshold slider, or scroll table columns.
fn step(view_state: &mut ViewState, delta: i64) {
    match view_state.focus {
        Focus::Threshold(kind) => {
            view_state.session.adjust_threshold(kind, delta);
            view_state.clamp_positions();
        }
        Focus::Table => shift_columns(view_state, delta.signum()),
        Focus::Facet(_) => {}
    }
}

fn shift_columns(view_state: &mut ViewState, delta: i64) {
    let last = view_state
        .session
        .dataset()
        .pct_fields()
        .len()
        .saturating_sub(1);
    view_state.column_offset = if delta < 0 {
        view_state.column_offset.saturating_sub(1)
    } else {
        (view_state.column_offset + 1).min(last)
    };
}

fn toggle_under_cursor(view_state: &mut ViewState) {
    let Focus::Facet(field) = view_state.focus else {
        return;
    };
    let cursor = view_state.cursor(field);
    let Some(value) = view_state
        .visible_options(field)
        .get(cursor)
        .map(|v| v.to_string())
    else {
        return;
    };
    view_state.session.toggle(field, &value);
    view_state.clamp_positions();
}

fn clear_focused(view_state: &mut ViewState) {
    match view_state.focus {
        Focus::Facet(field) => view_state.session.clear_field(field),
        Focus::Threshold(kind) => view_state.session.set_threshold(kind, 0),
        Focus::Table => return,
    }
    view_state.clamp_positions();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::{sample_state, FOCUS_ORDER};
    use crossterm::event::KeyEventState;
    use onball_core::dataset::IdentityField;
    use onball_core::CountKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(state: &mut crate::tui::ViewState, codes: &[KeyCode]) {
        for &code in codes {
            handle_key(key(code), state);
        }
    }

    fn shown(state: &crate::tui::ViewState) -> Vec<String> {
        state
            .session
            .presentation()
            .records(state.session.dataset())
            .map(|r| r.player.clone())
            .collect()
    }

    #[test]
    fn release_events_ignored() {
        let mut state = sample_state();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(handle_key(release, &mut state).is_none());
        assert!(!state.confirm_quit);
    }

    #[test]
    fn ctrl_c_quits_in_any_mode() {
        let mut state = sample_state();
        state.search_mode = true;
        let cmd = handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut state,
        );
        assert!(matches!(cmd, Some(UserCommand::Quit)));
    }

    #[test]
    fn q_asks_for_confirmation() {
        let mut state = sample_state();
        assert!(handle_key(key(KeyCode::Char('q')), &mut state).is_none());
        assert!(state.confirm_quit);
        assert!(handle_key(key(KeyCode::Char('n')), &mut state).is_none());
        assert!(!state.confirm_quit);

        handle_key(key(KeyCode::Char('q')), &mut state);
        let cmd = handle_key(key(KeyCode::Char('y')), &mut state);
        assert!(matches!(cmd, Some(UserCommand::Quit)));
    }

    #[test]
    fn tab_walks_focus_order() {
        let mut state = sample_state();
        for expected in FOCUS_ORDER.iter().skip(1) {
            handle_key(key(KeyCode::Tab), &mut state);
            assert_eq!(state.focus, *expected);
        }
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.focus, FOCUS_ORDER[0]);
        handle_key(key(KeyCode::BackTab), &mut state);
        assert_eq!(state.focus, Focus::Table);
    }

    #[test]
    fn space_toggles_option_under_cursor() {
        let mut state = sample_state();
        // Teams: BOS, LAL, NYK
        press(&mut state, &[KeyCode::Char('j'), KeyCode::Char('j'), KeyCode::Char(' ')]);
        assert!(state.session.filters().teams.contains("NYK"));
        assert_eq!(shown(&state), vec!["Bo Kim"]);

        press(&mut state, &[KeyCode::Char(' ')]);
        assert!(state.session.filters().teams.is_empty());
        assert_eq!(shown(&state).len(), 4);
    }

    #[test]
    fn cursor_stays_within_options() {
        let mut state = sample_state();
        press(&mut state, &[KeyCode::End]);
        assert_eq!(state.cursor(IdentityField::Team), 2);
        press(&mut state, &[KeyCode::Down]);
        assert_eq!(state.cursor(IdentityField::Team), 2);
        press(&mut state, &[KeyCode::Home]);
        assert_eq!(state.cursor(IdentityField::Team), 0);
        press(&mut state, &[KeyCode::Up]);
        assert_eq!(state.cursor(IdentityField::Team), 0);
    }

    #[test]
    fn search_then_toggle_selects_match() {
        let mut state = sample_state();
        state.set_focus(Focus::Facet(IdentityField::Player));
        press(
            &mut state,
            &[
                KeyCode::Char('/'),
                KeyCode::Char('r'),
                KeyCode::Char('a'),
                KeyCode::Char('y'),
                KeyCode::Enter,
            ],
        );
        assert!(!state.search_mode);
        assert_eq!(state.search_text, "ray");
        assert_eq!(state.visible_options(IdentityField::Player), vec!["Cy Ray"]);

        press(&mut state, &[KeyCode::Char(' ')]);
        assert_eq!(shown(&state), vec!["Cy Ray"]);
    }

    #[test]
    fn search_keys_do_not_trigger_commands() {
        let mut state = sample_state();
        handle_key(key(KeyCode::Char('/')), &mut state);
        assert!(handle_key(key(KeyCode::Char('q')), &mut state).is_none());
        assert!(handle_key(key(KeyCode::Char('e')), &mut state).is_none());
        assert!(!state.confirm_quit);
        assert_eq!(state.search_text, "qe");

        handle_key(key(KeyCode::Backspace), &mut state);
        assert_eq!(state.search_text, "q");
        handle_key(key(KeyCode::Esc), &mut state);
        assert!(!state.search_mode);
        assert!(state.search_text.is_empty());
    }

    #[test]
    fn slash_ignored_outside_facets() {
        let mut state = sample_state();
        state.set_focus(Focus::Table);
        handle_key(key(KeyCode::Char('/')), &mut state);
        assert!(!state.search_mode);
    }

    #[test]
    fn threshold_keys_move_slider() {
        let mut state = sample_state();
        state.set_focus(Focus::Threshold(CountKind::Drives));
        press(&mut state, &[KeyCode::Char('L'), KeyCode::Char('L'), KeyCode::Char('l')]);
        assert_eq!(state.session.filters().min_for(CountKind::Drives), 21);
        assert_eq!(shown(&state).len(), 3);

        press(&mut state, &[KeyCode::Char('H'), KeyCode::Char('H'), KeyCode::Char('H')]);
        assert_eq!(state.session.filters().min_for(CountKind::Drives), 0);

        state.set_focus(Focus::Threshold(CountKind::Isos));
        press(&mut state, &[KeyCode::Char('l')]);
        assert_eq!(state.session.filters().min_for(CountKind::Isos), 0);
    }

    #[test]
    fn x_clears_focused_control_only() {
        let mut state = sample_state();
        press(&mut state, &[KeyCode::Char(' ')]); // BOS
        state.set_focus(Focus::Threshold(CountKind::Drives));
        press(&mut state, &[KeyCode::Char('L'), KeyCode::Char('L'), KeyCode::Char('L'), KeyCode::Char('L'), KeyCode::Char('L')]);
        assert_eq!(shown(&state), vec!["Cy Ray"]);

        press(&mut state, &[KeyCode::Char('x')]);
        assert_eq!(state.session.filters().min_for(CountKind::Drives), 0);
        assert!(state.session.filters().teams.contains("BOS"));
        assert_eq!(shown(&state).len(), 2);

        press(&mut state, &[KeyCode::Char('c')]);
        assert!(state.session.filters().is_unrestricted());
    }

    #[test]
    fn table_scroll_is_bounded() {
        let mut state = sample_state();
        state.set_focus(Focus::Table);
        press(&mut state, &[KeyCode::PageDown]);
        assert_eq!(state.table_scroll, 2);
        press(&mut state, &[KeyCode::PageDown]);
        assert_eq!(state.table_scroll, 3);
        press(&mut state, &[KeyCode::Char('k')]);
        assert_eq!(state.table_scroll, 2);
    }

    #[test]
    fn columns_shift_within_pct_fields() {
        let mut state = sample_state();
        press(&mut state, &[KeyCode::Char('>'), KeyCode::Char('>'), KeyCode::Char('>')]);
        assert_eq!(state.column_offset, 1);
        press(&mut state, &[KeyCode::Char('<'), KeyCode::Char('<')]);
        assert_eq!(state.column_offset, 0);
    }

    #[test]
    fn command_keys_map_to_commands() {
        let mut state = sample_state();
        assert!(matches!(
            handle_key(key(KeyCode::Char('r')), &mut state),
            Some(UserCommand::Reload { force: false })
        ));
        assert!(matches!(
            handle_key(key(KeyCode::Char('R')), &mut state),
            Some(UserCommand::Reload { force: true })
        ));
        match handle_key(key(KeyCode::Char('e')), &mut state) {
            Some(UserCommand::Export(request)) => {
                assert_eq!(request.presentation.len(), 4);
            }
            other => panic!("expected Export, got {other:?}"),
        }
        assert_eq!(state.status_message.as_deref(), Some("Exporting..."));
    }
}
