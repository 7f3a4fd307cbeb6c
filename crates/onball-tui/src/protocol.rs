// Messages exchanged between the TUI and the app orchestrator.
//
// The TUI owns filter state and the presented table; anything that touches
// the filesystem (reloading the source, writing exports) goes through
// `UserCommand` and comes back as a `UiUpdate`.

use std::path::PathBuf;
use std::sync::Arc;

use onball_core::{Dataset, Loaded, Presentation};

/// Commands from the TUI to the app orchestrator.
#[derive(Debug)]
pub enum UserCommand {
    /// Re-read the data source. `force` drops the cached dataset first.
    Reload { force: bool },
    /// Write the currently presented table to the export directory.
    Export(Box<ExportRequest>),
    Quit,
}

/// Snapshot of what is on screen, handed over for export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub dataset: Arc<Dataset>,
    pub presentation: Presentation,
}

/// Results sent back to the TUI.
#[derive(Debug)]
pub enum UiUpdate {
    /// A freshly built dataset replaced the previous one.
    DatasetLoaded(Box<Loaded>),
    /// The source bytes matched the cached dataset; nothing to do.
    SourceUnchanged,
    Exported { path: PathBuf, rows: usize },
    /// A reload or export failed. The message is shown in the status bar.
    Failed(String),
}
