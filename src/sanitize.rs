// src/sanitize.rs

use arrow::datatypes::{Field, Schema};
use std::sync::Arc;

use crate::fetch::RemoteTable;

/// Column renames applied before a table is written. These columns collide
/// with a sibling that differs only by case or trailing whitespace, which
/// SQLite rejects as a duplicate.
pub const RENAME_RULES: &[(&str, &str)] = &[
    ("airport_fee", "airport_fee_1"),
    ("Flash Pass Available", "Flash_Pass_Available_1"),
];

/// SQLite table name for a dataset: `-` and ` ` become `_`, nothing else changes.
pub fn table_name(dataset: &str) -> String {
    dataset.replace(['-', ' '], "_")
}

fn renamed(column: &str) -> Option<&'static str> {
    RENAME_RULES
        .iter()
        .find(|(from, _)| *from == column)
        .map(|(_, to)| *to)
}

/// Apply [`RENAME_RULES`] to the table's column labels in place.
/// Returns how many columns were renamed.
pub fn sanitize_columns(table: &mut RemoteTable) -> usize {
    let mut count = 0;
    let fields: Vec<Field> = table
        .schema
        .fields()
        .iter()
        .map(|f| match renamed(f.name()) {
            Some(to) => {
                count += 1;
                f.as_ref().clone().with_name(to)
            }
            None => f.as_ref().clone(),
        })
        .collect();

    if count > 0 {
        table.schema = Arc::new(Schema::new_with_metadata(
            fields,
            table.schema.metadata().clone(),
        ));
    }
    count
}
