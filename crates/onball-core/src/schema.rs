// Schema normalization: trimmed column names, derived display name, and the
// required identity columns.

use thiserror::Error;
use tracing::debug;

use crate::table::{Cell, Table};

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const SEASON_KEY: &str = "SeasonKey";
pub const POSITION: &str = "playerPositionDescription";
pub const TEAM: &str = "TeamAbbrev";
pub const PLAYER_KEY: &str = "PlayerKey";
pub const PLAYER: &str = "Player";

/// Date key carried by the tracking export that nothing downstream uses.
pub const UNUSED_DATE_KEY: &str = "PredictionDateKey";

/// Text a missing name part renders as in the display name.
pub const MISSING_MARKER: &str = "nan";

/// Columns whose absence makes the source unusable.
pub const REQUIRED_COLUMNS: [&str; 4] = [SEASON_KEY, POSITION, FIRST_NAME, LAST_NAME];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required column `{column}` is missing")]
    MissingColumn { column: String },
}

/// Display name: first and last joined by one space, a missing part rendered
/// as `MISSING_MARKER`.
pub fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    format!(
        "{} {}",
        first.unwrap_or(MISSING_MARKER),
        last.unwrap_or(MISSING_MARKER)
    )
}

/// Normalize a freshly loaded table. The input is left untouched.
pub fn normalize(raw: &Table) -> Result<Table, SchemaError> {
    let mut table = raw.clone();
    for name in table.columns_mut().iter_mut() {
        *name = name.trim().to_string();
    }

    for column in REQUIRED_COLUMNS {
        if !table.has_column(column) {
            return Err(SchemaError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let first = table.column_index(FIRST_NAME).ok_or_else(|| missing(FIRST_NAME))?;
    let last = table.column_index(LAST_NAME).ok_or_else(|| missing(LAST_NAME))?;
    let names: Vec<Cell> = (0..table.len())
        .map(|row| Some(display_name(table.cell(row, first), table.cell(row, last))))
        .collect();
    match table.column_index(PLAYER) {
        Some(idx) => table.replace_column(idx, names),
        None => table.push_column(PLAYER.to_string(), names),
    }

    if let Some(idx) = table.column_index(UNUSED_DATE_KEY) {
        table.remove_column(idx);
        debug!("dropped unused column `{}`", UNUSED_DATE_KEY);
    }

    Ok(table)
}

fn missing(column: &str) -> SchemaError {
    SchemaError::MissingColumn {
        column: column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Table {
        Table::from_strs(
            &[" firstName", "lastName ", " SeasonKey ", "playerPositionDescription", "PredictionDateKey", "drives"],
            &[
                &["Jane", "Doe", "2024", "Guard", "20240101", "10"],
                &["", "Doe", "2024", "Guard", "20240101", "4"],
                &["Solo", "", "2023", "Wing", "20230101", "7"],
            ],
        )
    }

    #[test]
    fn column_names_trimmed() {
        let table = normalize(&raw()).unwrap();
        assert!(table.has_column("firstName"));
        assert!(table.has_column("lastName"));
        assert!(table.has_column("SeasonKey"));
    }

    #[test]
    fn player_name_joins_first_and_last() {
        let table = normalize(&raw()).unwrap();
        let names = table.column_values(PLAYER).unwrap();
        assert_eq!(names[0], Some("Jane Doe"));
    }

    #[test]
    fn missing_name_part_renders_marker() {
        let table = normalize(&raw()).unwrap();
        let names = table.column_values(PLAYER).unwrap();
        assert_eq!(names[1], Some("nan Doe"));
        assert_eq!(names[2], Some("Solo nan"));
    }

    #[test]
    fn player_column_appended_last() {
        let table = normalize(&raw()).unwrap();
        assert_eq!(table.columns().last().map(String::as_str), Some(PLAYER));
    }

    #[test]
    fn existing_player_column_overwritten_in_place() {
        let raw = Table::from_strs(
            &["Player", "firstName", "lastName", "SeasonKey", "playerPositionDescription"],
            &[&["stale", "Jane", "Doe", "2024", "Guard"]],
        );
        let table = normalize(&raw).unwrap();
        assert_eq!(table.column_index(PLAYER), Some(0));
        assert_eq!(table.cell(0, 0), Some("Jane Doe"));
        assert_eq!(table.columns().len(), 5);
    }

    #[test]
    fn unused_date_key_dropped() {
        let table = normalize(&raw()).unwrap();
        assert!(!table.has_column(UNUSED_DATE_KEY));
    }

    #[test]
    fn absent_date_key_is_fine() {
        let raw = Table::from_strs(
            &["firstName", "lastName", "SeasonKey", "playerPositionDescription"],
            &[&["Jane", "Doe", "2024", "Guard"]],
        );
        assert!(normalize(&raw).is_ok());
    }

    #[test]
    fn missing_position_is_schema_error() {
        let raw = Table::from_strs(&["firstName", "lastName", "SeasonKey"], &[&["a", "b", "2024"]]);
        assert_eq!(
            normalize(&raw).unwrap_err(),
            SchemaError::MissingColumn {
                column: POSITION.to_string()
            }
        );
    }

    #[test]
    fn missing_season_is_schema_error() {
        let raw = Table::from_strs(
            &["firstName", "lastName", "playerPositionDescription"],
            &[&["a", "b", "Guard"]],
        );
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.to_string(), "required column `SeasonKey` is missing");
    }

    #[test]
    fn input_table_not_mutated() {
        let before = raw();
        let copy = before.clone();
        let _ = normalize(&before).unwrap();
        assert_eq!(before, copy);
    }
}
