// In-memory tabular data: ordered column names plus rows of optional cells.

/// A single cell. `None` is a missing value.
pub type Cell = Option<String>;

/// Tokens that read as a missing value, matching the null markers most CSV
/// exports of dataframes use.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns true if the (already trimmed) text is a missing-value marker.
pub fn is_null_token(text: &str) -> bool {
    NULL_TOKENS.contains(&text)
}

/// Convert raw field text into a cell: trimmed, with null markers mapped to `None`.
pub fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if is_null_token(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Rectangular table. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding short rows with missing cells and truncating
    /// long ones so the table stays rectangular.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Table { columns, rows }
    }

    /// Convenience constructor for tests and fixtures: every `&str` goes
    /// through `parse_cell`.
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| parse_cell(v)).collect())
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (`row`, `col`) as a string slice, `None` when missing or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// All cells of a named column, top to bottom. `None` if the column does not exist.
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<String> {
        &mut self.columns
    }

    pub(crate) fn push_column(&mut self, name: String, values: Vec<Cell>) {
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub(crate) fn replace_column(&mut self, idx: usize, values: Vec<Cell>) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    pub(crate) fn remove_column(&mut self, idx: usize) {
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
    }
}
