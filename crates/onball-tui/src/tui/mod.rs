// TUI: facet/threshold sidebar, percentile table, status and help bars.
//
// The TUI owns a `ViewState` wrapping the filter `Session`. Filtering happens
// locally on every key press; reloads and exports are sent to the app
// orchestrator as `UserCommand`s and come back as `UiUpdate`s. The screen is
// re-rendered at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{info, warn};

use onball_core::dataset::IdentityField;
use onball_core::CountKind;

use crate::protocol::{UiUpdate, UserCommand};
use crate::session::Session;

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

/// Which control receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Facet(IdentityField),
    Threshold(CountKind),
    Table,
}

/// Tab order, top of the sidebar to the table.
pub const FOCUS_ORDER: [Focus; 8] = [
    Focus::Facet(IdentityField::Team),
    Focus::Facet(IdentityField::Season),
    Focus::Facet(IdentityField::Position),
    Focus::Facet(IdentityField::Player),
    Focus::Threshold(CountKind::Drives),
    Focus::Threshold(CountKind::Picks),
    Focus::Threshold(CountKind::Isos),
    Focus::Table,
];

impl Focus {
    fn position(self) -> usize {
        FOCUS_ORDER.iter().position(|&f| f == self).unwrap_or(0)
    }

    pub fn next(self) -> Focus {
        FOCUS_ORDER[(self.position() + 1) % FOCUS_ORDER.len()]
    }

    pub fn prev(self) -> Focus {
        FOCUS_ORDER[(self.position() + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Focus::Facet(field) => facet_label(field),
            Focus::Threshold(kind) => kind.label(),
            Focus::Table => "Table",
        }
    }
}

pub fn facet_label(field: IdentityField) -> &'static str {
    match field {
        IdentityField::Player => "Player",
        IdentityField::Team => "Team",
        IdentityField::Season => "Season",
        IdentityField::Position => "Position",
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Everything the renderer reads.
pub struct ViewState {
    pub session: Session,
    pub focus: Focus,
    /// Highlighted option per facet, indexing the visible (searched) list.
    pub facet_cursor: HashMap<IdentityField, usize>,
    /// Search text for the focused facet's options.
    pub search_text: String,
    /// Whether keystrokes go into `search_text`.
    pub search_mode: bool,
    /// First table row on screen.
    pub table_scroll: usize,
    /// First percentile column on screen.
    pub column_offset: usize,
    /// Rows moved by PageUp/PageDown.
    pub page_size: usize,
    /// Last reload/export outcome.
    pub status_message: Option<String>,
    pub confirm_quit: bool,
}

impl ViewState {
    pub fn new(session: Session, page_size: usize) -> Self {
        ViewState {
            session,
            focus: FOCUS_ORDER[0],
            facet_cursor: HashMap::new(),
            search_text: String::new(),
            search_mode: false,
            table_scroll: 0,
            column_offset: 0,
            page_size: page_size.max(1),
            status_message: None,
            confirm_quit: false,
        }
    }

    /// Options for `field`, narrowed by the search text while that facet has
    /// focus. Case-insensitive substring match.
    pub fn visible_options(&self, field: IdentityField) -> Vec<&str> {
        let options = self.session.options().for_field(field);
        let needle = self.search_text.to_lowercase();
        if needle.is_empty() || self.focus != Focus::Facet(field) {
            return options.iter().map(String::as_str).collect();
        }
        options
            .iter()
            .filter(|o| o.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn cursor(&self, field: IdentityField) -> usize {
        self.facet_cursor.get(&field).copied().unwrap_or(0)
    }

    pub fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            self.search_text.clear();
            self.search_mode = false;
            self.focus = focus;
        }
    }

    /// Pull scroll offsets and cursors back inside the current data.
    pub fn clamp_positions(&mut self) {
        let rows = self.session.presentation().len();
        self.table_scroll = self.table_scroll.min(rows.saturating_sub(1));
        let columns = self.session.dataset().pct_fields().len();
        self.column_offset = self.column_offset.min(columns.saturating_sub(1));
        for field in IdentityField::ALL {
            let len = self.visible_options(field).len();
            if let Some(cursor) = self.facet_cursor.get_mut(&field) {
                *cursor = (*cursor).min(len.saturating_sub(1));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::DatasetLoaded(loaded) => {
            let rows = loaded.dataset.len();
            state.session.replace_source(*loaded);
            state.clamp_positions();
            state.status_message = Some(format!("Reloaded {rows} rows"));
        }
        UiUpdate::SourceUnchanged => {
            state.status_message = Some("Source unchanged".to_string());
        }
        UiUpdate::Exported { path, rows } => {
            state.status_message = Some(format!("Exported {rows} rows to {}", path.display()));
        }
        UiUpdate::Failed(message) => {
            state.status_message = Some(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::filters::render(frame, layout.filters, state);
    widgets::filters::render_detail(frame, layout.detail, state);
    widgets::percentiles::render(frame, layout.table, state);
    render_help_bar(frame, &layout, state);
}

fn help_text(state: &ViewState) -> &'static str {
    if state.confirm_quit {
        " Quit? y:Yes | n:No"
    } else if state.search_mode {
        " Type to search | Enter:Keep | Esc:Cancel"
    } else {
        " Tab:Focus | j/k:Move | Space:Toggle | h/l:Min | /:Search | x:Clear | c:Clear all | </>:Cols | e:Export | r:Reload | q:Quit"
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the user quits or the orchestrator goes away.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = matches!(cmd, UserCommand::Quit);
                            if cmd_tx.send(cmd).await.is_err() {
                                warn!("app orchestrator stopped; leaving TUI");
                                break;
                            }
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    info!("TUI closed");

    Ok(())
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) const SAMPLE_CSV: &str = "PlayerKey,firstName,lastName,SeasonKey,TeamAbbrev,playerPositionDescription,drives,picks,pts_per_drive,defensive_impact_iso\n\
                                     1,Ann,Lee,2024,BOS,Guard,40,5,1.1,2.0\n\
                                     2,Bo,Kim,2024,NYK,Guard,60,15,0.9,3.0\n\
                                     3,Cy,Ray,2024,BOS,Guard,90,25,1.3,1.0\n\
                                     4,Di,Fox,2023,LAL,Big,10,0,0.7,0.5\n";

#[cfg(test)]
pub(crate) fn sample_state() -> ViewState {
    let loaded = onball_core::DatasetCache::new()
        .load_bytes("sample.csv", SAMPLE_CSV.as_bytes())
        .unwrap();
    let session = Session::new(loaded, vec!["defensive_impact_iso_pct".to_string()]);
    ViewState::new(session, 2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
