// Application orchestrator.
//
// Owns the dataset cache, the source path and the export directory. Runs as
// its own task, receiving `UserCommand`s from the TUI and answering with
// `UiUpdate`s.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{info, warn};

use onball_core::export::export_to_dir;
use onball_core::source::LoadError;
use onball_core::{DatasetCache, Loaded};

use crate::protocol::{ExportRequest, UiUpdate, UserCommand};

pub struct AppState {
    cache: DatasetCache,
    data_path: PathBuf,
    export_dir: PathBuf,
}

impl AppState {
    pub fn new(data_path: PathBuf, export_dir: PathBuf) -> Self {
        AppState {
            cache: DatasetCache::new(),
            data_path,
            export_dir,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Load (or reuse) the dataset for the configured source.
    pub fn load(&mut self) -> Result<Loaded, LoadError> {
        self.cache.load(&self.data_path)
    }

    /// Handle one command. Returns `None` for `Quit`.
    pub fn handle_command(&mut self, cmd: UserCommand) -> Option<UiUpdate> {
        match cmd {
            UserCommand::Reload { force } => Some(self.reload(force)),
            UserCommand::Export(request) => Some(self.export(&request)),
            UserCommand::Quit => None,
        }
    }

    fn reload(&mut self, force: bool) -> UiUpdate {
        if force {
            self.cache.invalidate();
        }
        match self.load() {
            Ok(loaded) if loaded.reused => {
                info!("reload: {} unchanged", loaded.source);
                UiUpdate::SourceUnchanged
            }
            Ok(loaded) => {
                info!(
                    "reload: rebuilt {} records from {} [{}]",
                    loaded.dataset.len(),
                    loaded.source,
                    loaded.fingerprint.short()
                );
                UiUpdate::DatasetLoaded(Box::new(loaded))
            }
            Err(e) => {
                warn!("reload failed: {}", e);
                UiUpdate::Failed(format!("Reload failed: {e}"))
            }
        }
    }

    fn export(&self, request: &ExportRequest) -> UiUpdate {
        match export_to_dir(
            &request.presentation,
            &request.dataset,
            &self.export_dir,
            Local::now(),
        ) {
            Ok(path) => UiUpdate::Exported {
                path,
                rows: request.presentation.len(),
            },
            Err(e) => {
                warn!("export failed: {}", e);
                UiUpdate::Failed(format!("Export failed: {e}"))
            }
        }
    }
}

/// Run the orchestrator until `Quit` arrives or either channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    while let Some(cmd) = cmd_rx.recv().await {
        let Some(update) = state.handle_command(cmd) else {
            info!("quit requested");
            break;
        };
        if ui_tx.send(update).await.is_err() {
            break;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
