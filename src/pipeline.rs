// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::{collections::BTreeMap, fmt};
use tracing::{error, info, warn};

use crate::catalog::{load_catalog, Catalog};
use crate::config::{Config, TargetsConfig};
use crate::error::PairError;
use crate::fetch::{Fetcher, Variant};
use crate::sanitize::{sanitize_columns, table_name};
use crate::sqlite::{open_target, write_table};

/// One open database per variant, held for the whole run.
pub struct Targets {
    sample: Connection,
    all: Connection,
}

impl Targets {
    pub fn open(config: &TargetsConfig) -> Result<Self> {
        Ok(Self {
            sample: open_target(&config.sample)?,
            all: open_target(&config.all)?,
        })
    }

    pub fn get_mut(&mut self, variant: Variant) -> &mut Connection {
        match variant {
            Variant::Sample => &mut self.sample,
            Variant::All => &mut self.all,
        }
    }

    /// Close both connections, reporting the first failure.
    pub fn close(self) -> Result<()> {
        let sample = self.sample.close().map_err(|(_, e)| e);
        let all = self.all.close().map_err(|(_, e)| e);
        sample.context("closing sample database")?;
        all.context("closing all database")?;
        Ok(())
    }
}

/// Result of processing a single (dataset, variant) pair.
#[derive(Debug)]
pub enum Outcome {
    Loaded { table: String, rows: u64 },
    /// The remote file does not exist.
    Skipped,
    Failed(PairError),
}

/// Fetch, sanitize and write one pair. Never fails the run.
pub async fn process_pair(
    fetcher: &Fetcher,
    conn: &mut Connection,
    name: &str,
    variant: Variant,
) -> Outcome {
    let table = table_name(name);
    let mut remote = match fetcher.fetch(name, variant).await {
        Ok(remote) => remote,
        Err(e) if e.is_not_found() => return Outcome::Skipped,
        Err(e) => return Outcome::Failed(e.into()),
    };
    sanitize_columns(&mut remote);
    match write_table(conn, &table, &remote) {
        Ok(rows) => Outcome::Loaded { table, rows },
        Err(e) => Outcome::Failed(e.into()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantSummary {
    pub loaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for VariantSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loaded, {} skipped, {} failed",
            self.loaded, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub variants: BTreeMap<Variant, VariantSummary>,
}

impl RunSummary {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            started: now,
            finished: now,
            variants: BTreeMap::new(),
        }
    }

    fn record(&mut self, variant: Variant, outcome: &Outcome) {
        let entry = self.variants.entry(variant).or_default();
        match outcome {
            Outcome::Loaded { .. } => entry.loaded += 1,
            Outcome::Skipped => entry.skipped += 1,
            Outcome::Failed(_) => entry.failed += 1,
        }
    }

    pub fn get(&self, variant: Variant) -> VariantSummary {
        self.variants.get(&variant).copied().unwrap_or_default()
    }

    pub fn failed(&self) -> usize {
        self.variants.values().map(|v| v.failed).sum()
    }
}

fn report(name: &str, variant: Variant, outcome: &Outcome) {
    match outcome {
        Outcome::Loaded { table, rows } => {
            info!(dataset = %name, variant = %variant, table = %table, rows, "loaded")
        }
        Outcome::Skipped => warn!(variant = %variant, "file for {} not found, skipping", name),
        Outcome::Failed(e) => error!(
            variant = %variant,
            stage = e.stage(),
            "error processing {}: {}",
            name,
            e
        ),
    }
}

/// Load every catalog entry into both target databases.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let catalog = load_catalog(&config.catalog.path, &config.catalog.column)?;
    info!(datasets = catalog.len(), "loaded catalog");
    let fetcher = Fetcher::new(&config.source);
    let targets = Targets::open(&config.targets)?;
    run_with(&catalog, &fetcher, targets).await
}

/// Drive every (variant, dataset) pair through `fetcher` into `targets`, then
/// close the targets.
pub async fn run_with(
    catalog: &Catalog,
    fetcher: &Fetcher,
    mut targets: Targets,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new();
    let total = catalog.len();

    for variant in Variant::ALL {
        info!(variant = %variant, total, "processing datasets");
        let conn = targets.get_mut(variant);
        for (idx, name) in catalog.names().iter().enumerate() {
            let outcome = process_pair(fetcher, conn, name, variant).await;
            report(name, variant, &outcome);
            summary.record(variant, &outcome);
            info!(variant = %variant, "progress {}/{}", idx + 1, total);
        }
        info!(variant = %variant, "{}", summary.get(variant));
    }

    targets.close()?;
    summary.finished = Utc::now();
    if total > 0 && summary.get(Variant::Sample).loaded + summary.get(Variant::All).loaded == 0 {
        warn!("no tables were written");
    }
    Ok(summary)
}
