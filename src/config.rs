// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "DATABENCH_CONFIG";

/// Top-level run configuration. Every field has a default, so an empty YAML
/// document (or no file at all) reproduces the stock run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub source: SourceConfig,
    pub targets: TargetsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Spreadsheet listing the datasets to load.
    pub path: PathBuf,
    /// Header of the column holding dataset names.
    pub column: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/questions-with-metadata-dataset.xlsx"),
            column: "dataset".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// `hf://datasets/<org>/<repo>`, an `http(s)://` base, or a local directory.
    pub root: String,
    /// Git revision used when resolving `hf://` locators.
    pub revision: String,
    /// Hub endpoint that `hf://` locators resolve against.
    pub endpoint: String,
    /// Bearer token for the hub; only ever taken from the environment.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: "hf://datasets/cardiffnlp/databench".to_string(),
            revision: "main".to_string(),
            endpoint: "https://huggingface.co".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    /// Database receiving the `sample` variant.
    pub sample: PathBuf,
    /// Database receiving the `all` variant.
    pub all: PathBuf,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            sample: PathBuf::from("semeval-lite.db"),
            all: PathBuf::from("semeval.db"),
        }
    }
}

impl Config {
    /// Build the config for this process: defaults, overlaid by the YAML file
    /// named in `DATABENCH_CONFIG` (if set), then `HF_ENDPOINT` / `HF_TOKEN`.
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path))?,
            None => Self::default(),
        };

        if let Ok(endpoint) = env::var("HF_ENDPOINT") {
            if !endpoint.is_empty() {
                config.source.endpoint = endpoint;
            }
        }
        config.source.token = env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
