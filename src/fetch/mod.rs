// src/fetch/mod.rs

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use futures_util::StreamExt;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use reqwest::{Client, StatusCode};
use std::{fmt, path::Path};
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

use crate::config::SourceConfig;
use crate::error::FetchError;

pub mod locator;

pub use locator::{locator, resolve, Resource};

/// Snapshot size of a dataset. Each variant is written to its own database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Sample,
    All,
}

impl Variant {
    /// Processing order: every sample table first, then every full table.
    pub const ALL: [Variant; 2] = [Variant::Sample, Variant::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Sample => "sample",
            Variant::All => "all",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetched table held in memory for a single iteration.
///
/// `schema` is authoritative for column names; the batches supply the column
/// data in the same order. Renames only touch `schema`.
#[derive(Debug, Clone)]
pub struct RemoteTable {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl RemoteTable {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }
}

/// Fetches `<root>/data/<name>/<variant>.parquet` from the hub, any HTTP base,
/// or a local mirror directory.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    root: String,
    endpoint: String,
    revision: String,
    token: Option<String>,
}

impl Fetcher {
    pub fn new(source: &SourceConfig) -> Self {
        Self::with_client(Client::new(), source)
    }

    pub fn with_client(client: Client, source: &SourceConfig) -> Self {
        Self {
            client,
            root: source.root.clone(),
            endpoint: source.endpoint.clone(),
            revision: source.revision.clone(),
            token: source.token.clone(),
        }
    }

    pub fn locator(&self, name: &str, variant: Variant) -> String {
        locator(&self.root, name, variant)
    }

    /// Retrieve and decode one (dataset, variant) pair.
    #[instrument(level = "debug", skip(self, variant), fields(variant = %variant))]
    pub async fn fetch(&self, name: &str, variant: Variant) -> Result<RemoteTable, FetchError> {
        let loc = self.locator(name, variant);
        let bytes = match resolve(&loc, &self.endpoint, &self.revision)? {
            Resource::Http(url) => self.download(&loc, url).await?,
            Resource::Local(path) => read_local(&loc, &path).await?,
        };
        debug!(bytes = bytes.len(), "fetched {}", loc);
        decode_parquet(&loc, bytes)
    }

    async fn download(&self, loc: &str, url: Url) -> Result<Bytes, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let mut req = self.client.get(url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(http_err)?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    locator: loc.to_string(),
                })
            }
            status => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                })
            }
        }

        let mut body = Vec::with_capacity(resp.content_length().unwrap_or(0) as usize);
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http_err)?;
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }
}

async fn read_local(loc: &str, path: &Path) -> Result<Bytes, FetchError> {
    match fs::read(path).await {
        Ok(data) => Ok(Bytes::from(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
            locator: loc.to_string(),
        }),
        Err(source) => Err(FetchError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Decode an in-memory Parquet file into Arrow record batches.
pub fn decode_parquet(loc: &str, bytes: Bytes) -> Result<RemoteTable, FetchError> {
    let decode_err = |source| FetchError::Decode {
        locator: loc.to_string(),
        source,
    };
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(decode_err)?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(decode_err)?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| FetchError::Batch {
            locator: loc.to_string(),
            source,
        })?;
    Ok(RemoteTable::new(schema, batches))
}
