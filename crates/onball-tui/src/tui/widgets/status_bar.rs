// Status bar widget: data source, fingerprint, row counts, last action.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![
        Span::styled(
            " onball ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(source_text(state), Style::default().fg(Color::White)),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(rows_text(state), Style::default().fg(Color::White)),
    ];

    if let Some(message) = &state.status_message {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// `drives.csv [1a2b3c4d5e6f] 14:02:11`
pub fn source_text(state: &ViewState) -> String {
    let loaded = state.session.loaded();
    let name = std::path::Path::new(&loaded.source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| loaded.source.clone());
    format!(
        "{} [{}] {}",
        name,
        loaded.fingerprint.short(),
        loaded.built_at.format("%H:%M:%S")
    )
}

/// `12/240 rows | 38 cohorts | 9 ranked`
pub fn rows_text(state: &ViewState) -> String {
    let dataset = state.session.dataset();
    format!(
        "{}/{} rows | {} cohorts | {} ranked",
        state.session.presentation().len(),
        dataset.len(),
        dataset.cohort_count(),
        dataset.pct_fields().len()
    )
}
