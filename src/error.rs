//! Typed errors for the per-dataset stages.
//!
//! The driver needs to tell a missing remote file apart from a broken one, and
//! a fetch failure apart from a write failure, so these stay as enums instead
//! of `anyhow::Error`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, downloading or decoding a remote table.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The resource does not exist at the resolved location.
    #[error("not found: {locator}")]
    NotFound { locator: String },

    /// The locator could not be mapped to a URL or path.
    #[error("invalid locator {locator}: {reason}")]
    Locator { locator: String, reason: String },

    /// The server answered with a non-success status other than 404.
    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a readable Parquet file.
    #[error("decoding parquet from {locator}: {source}")]
    Decode {
        locator: String,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("reading record batch from {locator}: {source}")]
    Batch {
        locator: String,
        #[source]
        source: arrow::error::ArrowError,
    },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Errors raised while persisting a table into SQLite.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Two columns differ only by ASCII case; SQLite treats them as the same.
    #[error("table {table}: columns {first:?} and {second:?} collide case-insensitively")]
    DuplicateColumn {
        table: String,
        first: String,
        second: String,
    },

    #[error("table {table} has no columns")]
    NoColumns { table: String },

    /// A column could not be converted to an SQLite value.
    #[error("table {table}, column {column:?}: {source}")]
    Convert {
        table: String,
        column: String,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("table {table}: {source}")]
    Sqlite {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Failure of a single (dataset, variant) pair, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PairError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("write failed: {0}")]
    Write(#[from] WriteError),
}

impl PairError {
    pub fn stage(&self) -> &'static str {
        match self {
            PairError::Fetch(_) => "fetch",
            PairError::Write(_) => "write",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let fetch = PairError::from(FetchError::NotFound {
            locator: "hf://datasets/x/y/data/a/all.parquet".into(),
        });
        assert_eq!(fetch.stage(), "fetch");

        let write = PairError::from(WriteError::NoColumns {
            table: "empty".into(),
        });
        assert_eq!(write.stage(), "write");
        assert!(write.to_string().contains("empty"));
    }

    #[test]
    fn test_not_found_is_classified() {
        let err = FetchError::NotFound {
            locator: "missing".into(),
        };
        assert!(err.is_not_found());
        let err = FetchError::Locator {
            locator: "hf://models/x".into(),
            reason: "only datasets are supported".into(),
        };
        assert!(!err.is_not_found());
    }
}
