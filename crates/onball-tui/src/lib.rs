// Terminal front end for the on-ball percentile explorer.

pub mod app;
pub mod config;
pub mod protocol;
pub mod session;
pub mod tui;
