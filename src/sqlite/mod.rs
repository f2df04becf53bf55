// src/sqlite/mod.rs

use anyhow::{Context, Result};
use arrow::error::ArrowError;
use rusqlite::{params_from_iter, Connection};
use std::{collections::HashMap, path::Path, time::Instant};
use tracing::{debug, instrument};

use crate::error::WriteError;
use crate::fetch::RemoteTable;

pub mod types;

pub use types::{SqlColumn, SqlType};

/// Open the database at `path`, creating the file if it doesn't exist.
pub fn open_target(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Connection::open(path).with_context(|| format!("opening database {}", path.display()))
}

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replace `name` in `conn` with the contents of `table`, returning rows written.
///
/// The drop, create and inserts share one transaction; on error the previous
/// table (if any) is left as it was.
#[instrument(level = "debug", skip(conn, table), fields(rows = table.num_rows()))]
pub fn write_table(
    conn: &mut Connection,
    name: &str,
    table: &RemoteTable,
) -> Result<u64, WriteError> {
    let start = Instant::now();
    check_columns(name, table)?;

    let sqlite_err = |source| WriteError::Sqlite {
        table: name.to_string(),
        source,
    };
    let fields = table.schema.fields();
    let quoted = quote_ident(name);

    let columns = fields
        .iter()
        .map(|f| {
            format!(
                "{} {}",
                quote_ident(f.name()),
                SqlType::of(f.data_type()).declared()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=fields.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn.transaction().map_err(sqlite_err)?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {q};\nCREATE TABLE {q} ({columns});",
        q = quoted,
        columns = columns
    ))
    .map_err(sqlite_err)?;

    let mut written = 0u64;
    {
        let mut stmt = tx
            .prepare_cached(&format!("INSERT INTO {} VALUES ({})", quoted, placeholders))
            .map_err(sqlite_err)?;

        for batch in &table.batches {
            let convert_err = |idx: usize| {
                let column = fields[idx].name().clone();
                move |source: ArrowError| WriteError::Convert {
                    table: name.to_string(),
                    column,
                    source,
                }
            };

            let columns = batch
                .columns()
                .iter()
                .enumerate()
                .map(|(idx, array)| SqlColumn::new(array).map_err(convert_err(idx)))
                .collect::<Result<Vec<_>, _>>()?;
            let cells = columns
                .iter()
                .enumerate()
                .map(|(idx, col)| col.cells().map_err(convert_err(idx)))
                .collect::<Result<Vec<_>, _>>()?;

            let mut row_values = Vec::with_capacity(cells.len());
            for row in 0..batch.num_rows() {
                row_values.clear();
                for (idx, col) in cells.iter().enumerate() {
                    row_values.push(col.value(row).map_err(convert_err(idx))?);
                }
                stmt.execute(params_from_iter(row_values.iter()))
                    .map_err(sqlite_err)?;
                written += 1;
            }
        }
    }
    tx.commit().map_err(sqlite_err)?;

    debug!(rows = written, elapsed = ?start.elapsed(), "wrote table {}", name);
    Ok(written)
}

/// SQLite compares identifiers case-insensitively for ASCII, so `airport_fee`
/// and `Airport_fee` are the same column.
fn check_columns(name: &str, table: &RemoteTable) -> Result<(), WriteError> {
    let fields = table.schema.fields();
    if fields.is_empty() {
        return Err(WriteError::NoColumns {
            table: name.to_string(),
        });
    }
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(fields.len());
    for f in fields.iter() {
        if let Some(first) = seen.insert(f.name().to_ascii_lowercase(), f.name()) {
            return Err(WriteError::DuplicateColumn {
                table: name.to_string(),
                first: first.to_string(),
                second: f.name().to_string(),
            });
        }
    }
    Ok(())
}
