// Percentile table widget: identity columns plus one colour-scaled cell per
// ranked metric, in presentation order.

use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use onball_core::dataset::IdentityField;
use onball_core::percentile::PCT_SUFFIX;
use onball_core::presentation::{cell_colors, format_pct, Rgb};

use crate::tui::{facet_label, Focus, ViewState};

/// Header, top and bottom border.
const CHROME_ROWS: u16 = 3;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let session = &state.session;
    let presentation = session.presentation();
    let dataset = session.dataset();

    let border_style = if state.focus == Focus::Table {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(build_title(state));

    if presentation.is_empty() {
        let paragraph = Paragraph::new("No rows match the current filters.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let fields = visible_fields(&presentation.pct_fields, state.column_offset);
    let first_field = presentation.pct_fields.len() - fields.len();

    let mut header_cells = vec![Cell::from("#")];
    header_cells.extend(
        presentation
            .identity_columns
            .iter()
            .map(|&f| Cell::from(facet_label(f))),
    );
    header_cells.extend(
        fields
            .iter()
            .map(|f| Cell::from(Line::from(header_label(f)).alignment(Alignment::Right))),
    );
    let header = Row::new(header_cells).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let visible_rows = usize::from(area.height.saturating_sub(CHROME_ROWS));
    let rows: Vec<Row> = presentation
        .records(dataset)
        .enumerate()
        .skip(state.table_scroll)
        .take(visible_rows)
        .map(|(i, record)| {
            let mut cells = vec![Cell::from(format!("{}", i + 1))];
            cells.extend(
                presentation
                    .identity_columns
                    .iter()
                    .map(|&f| Cell::from(record.identity(f).unwrap_or("").to_string())),
            );
            cells.extend(
                record.percentiles[first_field..]
                    .iter()
                    .map(|&value| {
                        Cell::from(Line::from(format_pct(value)).alignment(Alignment::Right))
                            .style(pct_cell_style(value))
                    }),
            );
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(4)];
    widths.extend(
        presentation
            .identity_columns
            .iter()
            .map(|&f| identity_width(f)),
    );
    widths.extend(fields.iter().map(|f| pct_width(f)));

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn build_title(state: &ViewState) -> String {
    let presentation = state.session.presentation();
    let sort: Vec<&str> = presentation
        .sort_keys
        .iter()
        .map(|k| k.label())
        .collect();
    format!(
        " Percentiles within season/position ({} rows) | sort: {} ",
        presentation.len(),
        sort.join(", ")
    )
}

/// Percentile fields from `offset` on; always at least the last one.
pub fn visible_fields(fields: &[String], offset: usize) -> &[String] {
    &fields[offset.min(fields.len().saturating_sub(1)).min(fields.len())..]
}

/// Column header: the metric name without the percentile suffix.
pub fn header_label(field: &str) -> &str {
    field.strip_suffix(PCT_SUFFIX).unwrap_or(field)
}

fn identity_width(field: IdentityField) -> Constraint {
    match field {
        IdentityField::Player => Constraint::Length(22),
        IdentityField::Team => Constraint::Length(5),
        IdentityField::Season => Constraint::Length(7),
        IdentityField::Position => Constraint::Length(10),
    }
}

fn pct_width(field: &str) -> Constraint {
    let len = header_label(field).chars().count().max(5);
    Constraint::Length(u16::try_from(len).unwrap_or(u16::MAX))
}

pub fn to_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Diverging background with legible text; missing cells are dimmed.
pub fn pct_cell_style(value: Option<f64>) -> Style {
    match cell_colors(value) {
        Some((bg, fg)) => Style::default().bg(to_color(bg)).fg(to_color(fg)),
        None => Style::default().fg(Color::DarkGray),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
