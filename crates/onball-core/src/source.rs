// Source loading: delimited text into a `Table`, plus content fingerprints
// used to key the dataset cache.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::schema::SchemaError;
use crate::table::{parse_cell, Table};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: TableError },

    #[error("schema error in {path}: {source}")]
    Schema { path: String, source: SchemaError },
}

/// A CSV document that cannot be turned into a complete table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("line {line}: {fields} fields, header has {width}")]
    TooManyFields {
        line: u64,
        fields: usize,
        width: usize,
    },
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// SHA-256 digest of a source file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Fingerprint(Sha256::digest(bytes).into())
    }

    /// First 12 hex digits, enough to tell sources apart in the status bar.
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader
// ---------------------------------------------------------------------------

/// Rename repeated header names to `name.1`, `name.2`, ... so every column is
/// addressable by name.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for name in headers {
        if seen.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let mut n = 1;
        let renamed = loop {
            let candidate = format!("{name}.{n}");
            if !seen.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        seen.insert(renamed.clone());
        out.push(renamed);
    }
    out
}

/// Read a CSV document with a header row into a `Table`.
///
/// Short rows are padded with missing cells. A row with more fields than the
/// header, or one that is not valid UTF-8, fails the whole read: dropping it
/// would remove a peer from its cohort.
pub fn read_table<R: Read>(rdr: R) -> Result<Table, TableError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let headers = dedupe_headers(headers);
    let width = headers.len();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.len() > width {
            return Err(TableError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                fields: record.len(),
                width,
            });
        }
        rows.push(record.iter().map(parse_cell).collect());
    }
    Ok(Table::new(headers, rows))
}

/// Parse in-memory CSV bytes. Used by the cache so the file is read once for
/// both fingerprinting and parsing.
pub fn read_table_from_bytes(bytes: &[u8], source: &str) -> Result<Table, LoadError> {
    read_table(bytes).map_err(|e| LoadError::Csv {
        path: source.to_string(),
        source: e,
    })
}

/// Read a file's bytes, mapping the I/O error with its path.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load a CSV file into a `Table`.
pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    let bytes = read_bytes(path)?;
    read_table_from_bytes(&bytes, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
