// TUI widget modules for each dashboard panel.

pub mod filters;
pub mod percentiles;
pub mod status_bar;
