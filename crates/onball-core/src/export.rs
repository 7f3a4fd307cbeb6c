// CSV export of the displayed table (identity + percentile columns, display order).

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::dataset::Dataset;
use crate::presentation::Presentation;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// `onball-view-YYYYmmdd-HHMMSS.csv`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("onball-view-{}.csv", at.format("%Y%m%d-%H%M%S"))
}

/// Write the presented rows as CSV. Missing cells are empty, percentiles keep
/// one decimal.
pub fn write_csv<W: Write>(
    presentation: &Presentation,
    dataset: &Dataset,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(presentation.column_names())?;
    for record in presentation.records(dataset) {
        let mut row: Vec<String> = presentation
            .identity_columns
            .iter()
            .map(|&f| record.identity(f).unwrap_or_default().to_string())
            .collect();
        row.extend(
            record
                .percentiles
                .iter()
                .map(|p| p.map(|v| format!("{v:.1}")).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the presented rows into `dir` under a timestamped name and return
/// the file path. Creates `dir` if needed.
pub fn export_to_dir(
    presentation: &Presentation,
    dataset: &Dataset,
    dir: &Path,
    at: DateTime<Local>,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;
    let path = dir.join(export_file_name(at));
    let file = std::fs::File::create(&path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    write_csv(presentation, dataset, file)?;
    info!("exported {} rows to {}", presentation.len(), path.display());
    Ok(path)
}
