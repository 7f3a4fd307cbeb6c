// onball entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Resolve the data source (first argument overrides config)
// 4. Build the dataset: normalize, classify, rank per cohort
// 5. Spawn the app orchestrator task
// 6. Run the TUI until quit

use std::path::PathBuf;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use onball_tui::app;
use onball_tui::config;
use onball_tui::session::Session;
use onball_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("onball starting up");

    let config = config::load_config().context("failed to load configuration")?;

    let data_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.data.path));
    let export_dir = config.export.resolve_dir();
    info!(
        "Config loaded: data={}, exports={}",
        data_path.display(),
        export_dir.display()
    );

    let mut app_state = app::AppState::new(data_path.clone(), export_dir);
    let loaded = app_state
        .load()
        .with_context(|| format!("failed to load {}", data_path.display()))?;
    info!(
        "{} records, {} cohorts, ranked: {}",
        loaded.dataset.len(),
        loaded.dataset.cohort_count(),
        loaded.dataset.eligible_metrics().join(", ")
    );
    let skipped = loaded.dataset.skipped_candidates();
    if !skipped.is_empty() {
        info!("not ranked (no numeric values): {}", skipped.join(", "));
    }

    let session = Session::new(loaded, config.display.sort_preference.clone())
        .with_filters(config.filters.clone());
    let view_state = tui::ViewState::new(session, config.display.page_size);

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, ui_rx) = mpsc::channel(16);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    if let Err(e) = tui::run(ui_rx, cmd_tx, view_state).await {
        error!("TUI error: {}", e);
    }

    // cmd_tx was moved into the TUI and is dropped by now, so the app loop ends.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), app_handle).await;

    info!("onball shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("onball.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("onball_core=info,onball_tui=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
