// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +------------------+-------------------------------+
// | Filters (9 rows) | Percentile table              |
// +------------------+                               |
// | Detail (fill)    |                               |
// +------------------+-------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Sidebar width in columns.
pub const SIDEBAR_WIDTH: u16 = 34;

/// Resolved screen areas.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: source, fingerprint, row counts, last action.
    pub status_bar: Rect,
    /// Sidebar top: one line per facet and threshold.
    pub filters: Rect,
    /// Sidebar bottom: options, slider or legend for the focused control.
    pub detail: Rect,
    /// Main area: the percentile table.
    pub table: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(10),   // sidebar + table
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
        .split(vertical[1]);

    // 7 controls + borders
    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(horizontal[0]);

    AppLayout {
        status_bar: vertical[0],
        filters: sidebar[0],
        detail: sidebar[1],
        table: horizontal[1],
        help_bar: vertical[2],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 160, 50)
    }

    #[test]
    fn layout_all_rects_nonzero() {
        let layout = build_layout(test_area());
        let rects = [
            ("status_bar", layout.status_bar),
            ("filters", layout.filters),
            ("detail", layout.detail),
            ("table", layout.table),
            ("help_bar", layout.help_bar),
        ];
        for (name, rect) in &rects {
            assert!(
                rect.width > 0 && rect.height > 0,
                "{} has zero area: {:?}",
                name,
                rect
            );
        }
    }

    #[test]
    fn layout_bars_are_one_row() {
        let layout = build_layout(test_area());
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.help_bar.height, 1);
    }

    #[test]
    fn layout_sidebar_fixed_width_table_gets_rest() {
        let layout = build_layout(test_area());
        assert_eq!(layout.filters.width, SIDEBAR_WIDTH);
        assert_eq!(layout.detail.width, SIDEBAR_WIDTH);
        assert_eq!(layout.table.width, 160 - SIDEBAR_WIDTH);
        assert_eq!(layout.table.x, SIDEBAR_WIDTH);
    }

    #[test]
    fn layout_filters_above_detail() {
        let layout = build_layout(test_area());
        assert_eq!(layout.filters.height, 9);
        assert!(layout.filters.y < layout.detail.y);
        assert_eq!(
            layout.filters.height + layout.detail.height,
            layout.table.height
        );
    }

    #[test]
    fn layout_fits_within_area() {
        let area = test_area();
        let layout = build_layout(area);
        for rect in [
            layout.status_bar,
            layout.filters,
            layout.detail,
            layout.table,
            layout.help_bar,
        ] {
            assert!(rect.right() <= area.right());
            assert!(rect.bottom() <= area.bottom());
        }
    }
}
