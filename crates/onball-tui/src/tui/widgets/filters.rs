// Filter sidebar: a one-line summary per control, and a detail pane for the
// focused one (option list, threshold gauge, or colour legend).

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use onball_core::dataset::IdentityField;
use onball_core::presentation::{pct_color, PCT_RANGE};
use onball_core::CountKind;

use crate::tui::widgets::percentiles::to_color;
use crate::tui::{facet_label, Focus, ViewState, FOCUS_ORDER};

/// Render the control summary list.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines: Vec<Line> = FOCUS_ORDER
        .iter()
        .filter(|&&f| f != Focus::Table)
        .map(|&focus| {
            let focused = state.focus == focus;
            let marker = if focused { ">" } else { " " };
            let style = if focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{marker} {:<9}", focus.label()), style),
                Span::raw(control_summary(state, focus)),
            ])
        })
        .collect();

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Filters"));
    frame.render_widget(paragraph, area);
}

/// Short value text for one sidebar control.
pub fn control_summary(state: &ViewState, focus: Focus) -> String {
    let filters = state.session.filters();
    match focus {
        Focus::Facet(field) => {
            let accepted = filters.accepted(field);
            match accepted.len() {
                0 => "all".to_string(),
                1 => accepted.iter().next().cloned().unwrap_or_default(),
                n => format!("{n} selected"),
            }
        }
        Focus::Threshold(kind) => {
            let range = state.session.range(kind);
            if range.enabled {
                format!(">= {} (max {})", filters.min_for(kind), range.max)
            } else {
                "n/a".to_string()
            }
        }
        Focus::Table => String::new(),
    }
}

/// Render the detail pane for the focused control.
pub fn render_detail(frame: &mut Frame, area: Rect, state: &ViewState) {
    match state.focus {
        Focus::Facet(field) => render_options(frame, area, state, field),
        Focus::Threshold(kind) => render_threshold(frame, area, state, kind),
        Focus::Table => render_legend(frame, area, state),
    }
}

fn options_title(state: &ViewState, field: IdentityField) -> String {
    let selected = state.session.filters().accepted(field).len();
    let total = state.session.options().for_field(field).len();
    let mut title = format!("{} ({selected}/{total})", facet_label(field));
    if state.search_mode || !state.search_text.is_empty() {
        title.push_str(&format!(" /{}", state.search_text));
        if state.search_mode {
            title.push('_');
        }
    }
    title
}

fn render_options(frame: &mut Frame, area: Rect, state: &ViewState, field: IdentityField) {
    let accepted = state.session.filters().accepted(field);
    let items: Vec<ListItem> = state
        .visible_options(field)
        .into_iter()
        .map(|value| {
            let mark = if accepted.contains(value) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {value}"))
        })
        .collect();

    let empty = items.is_empty();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(options_title(state, field)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !empty {
        list_state.select(Some(state.cursor(field)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_threshold(frame: &mut Frame, area: Rect, state: &ViewState, kind: CountKind) {
    let range = state.session.range(kind);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!("Minimum {}", kind.label()));

    if !range.enabled {
        let paragraph = Paragraph::new(format!(
            "No {} counts in this data.\nThreshold is fixed at 0.",
            kind.column()
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let min = state.session.filters().min_for(kind);
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(threshold_ratio(min, range.max))
        .label(format!("{min} / {}", range.max));
    frame.render_widget(gauge, area);
}

/// Fill fraction for the threshold gauge.
pub fn threshold_ratio(min: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        (f64::from(min) / f64::from(max)).clamp(0.0, 1.0)
    }
}

fn render_legend(frame: &mut Frame, area: Rect, state: &ViewState) {
    let dataset = state.session.dataset();
    let (lo, hi) = PCT_RANGE;

    // 0, 10, ..., 100
    let swatches: Vec<Span> = (0..=10)
        .map(|i| {
            let value = lo + (hi - lo) * f64::from(i) / 10.0;
            Span::styled("  ", Style::default().bg(to_color(pct_color(value))))
        })
        .collect();

    let mut lines = vec![
        Line::from(swatches),
        Line::from(format!("{lo:<4.0}{:>18.0}", hi)),
        Line::from(""),
        Line::from(format!("Cohorts: {}", dataset.cohort_count())),
        Line::from(format!("Ranked metrics: {}", dataset.pct_fields().len())),
    ];
    let skipped = dataset.skipped_candidates();
    if !skipped.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Not ranked (no numbers):",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(skipped.into_iter().map(|c| Line::from(format!("  {c}"))));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Legend"),
        );
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::sample_state;

    #[test]
    fn facet_summary_counts_selections() {
        let mut state = sample_state();
        let team = Focus::Facet(IdentityField::Team);
        assert_eq!(control_summary(&state, team), "all");
        state.session.toggle(IdentityField::Team, "BOS");
        assert_eq!(control_summary(&state, team), "BOS");
        state.session.toggle(IdentityField::Team, "NYK");
        assert_eq!(control_summary(&state, team), "2 selected");
    }

    #[test]
    fn threshold_summary_shows_range_or_na() {
        let mut state = sample_state();
        let drives = Focus::Threshold(CountKind::Drives);
        assert_eq!(control_summary(&state, drives), ">= 0 (max 90)");
        state.session.set_threshold(CountKind::Drives, 30);
        assert_eq!(control_summary(&state, drives), ">= 30 (max 90)");
        assert_eq!(
            control_summary(&state, Focus::Threshold(CountKind::Isos)),
            "n/a"
        );
    }

    #[test]
    fn options_title_includes_search() {
        let mut state = sample_state();
        assert_eq!(options_title(&state, IdentityField::Team), "Team (0/3)");
        state.search_mode = true;
        state.search_text = "bo".to_string();
        assert_eq!(options_title(&state, IdentityField::Team), "Team (0/3) /bo_");
    }

    #[test]
    fn gauge_ratio_bounds() {
        assert_eq!(threshold_ratio(0, 90), 0.0);
        assert_eq!(threshold_ratio(45, 90), 0.5);
        assert_eq!(threshold_ratio(90, 90), 1.0);
        assert_eq!(threshold_ratio(5, 0), 0.0);
    }
}
