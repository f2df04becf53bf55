pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod sanitize;
pub mod sqlite;

pub use catalog::{load_catalog, Catalog};
pub use config::Config;
pub use error::{FetchError, PairError, WriteError};
pub use fetch::{Fetcher, RemoteTable, Variant};
pub use pipeline::{run, Outcome, RunSummary};
