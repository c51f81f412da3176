use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

use crate::collection::StoreOptions;
use crate::kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, KvError};
use crate::latency::{Latency, LatencyConfig, LatencyMode};
use crate::query::DEFAULT_PAGE_SIZE;

/// Environment variable overriding `[api] base_url`.
pub const API_BASE_ENV: &str = "ERP_API_BASE";

#[derive(Parser, Debug)]
#[command(name = "erp-store", about = "Inspect and maintain persisted ERP collections")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "erp-store.toml")]
    pub config: String,

    /// Directory of the file-backed store (overrides config file)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Skip simulated latency
    #[arg(long)]
    pub no_latency: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List one page of a module's records
    List(ListArgs),
    /// Print one record
    Get { module: String, id: String },
    /// Delete records, as the saved user's role unless --role is given
    Delete {
        module: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Restore seed data for one module, or all of them
    Reset { module: Option<String> },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub module: String,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long)]
    pub page_size: Option<usize>,
    #[arg(long)]
    pub sort_by: Option<String>,
    #[arg(long)]
    pub desc: bool,
    /// Case-insensitive search over every field
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub latency: LatencyConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_data_dir")]
    pub path: PathBuf,

    /// Prepended to every entity key, e.g. "mock-data-".
    #[serde(default)]
    pub key_prefix: String,

    /// Byte quota for the in-memory backend.
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiConfig {
    /// Base URL of the REST backend; trailing slashes are ignored.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("erp-data")
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: Backend::default(),
            path: default_data_dir(),
            key_prefix: String::new(),
            quota_bytes: None,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            default_page_size: default_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Read and parse a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Config for the CLI: the config file (defaults when missing or
    /// unparseable), then the environment, then CLI flags.
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match Self::from_path(&cli.config) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Config::default(),
            Err(err) => {
                eprintln!("Warning: {err}");
                Config::default()
            }
        };

        config.apply_env(std::env::var(API_BASE_ENV).ok());

        // CLI overrides
        if let Some(dir) = &cli.data_dir {
            config.storage.path = dir.clone();
        }
        if let Some(level) = &cli.log_level {
            config.logging.level = level.clone();
        }
        if cli.no_latency {
            config.latency.mode = LatencyMode::None;
        }

        config
    }

    fn apply_env(&mut self, api_base: Option<String>) {
        if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.api.base_url = Some(base.trim().to_string());
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            latency: Latency::from(&self.latency),
            key_prefix: self.storage.key_prefix.clone(),
            default_page_size: self.pagination.default_page_size.max(1),
        }
    }

    /// Open the configured key-value backend.
    pub fn open_kv(&self) -> Result<Arc<dyn KeyValueStore>, KvError> {
        let kv: Arc<dyn KeyValueStore> = match self.storage.backend {
            Backend::File => Arc::new(FileKeyValueStore::open(self.storage.path.clone())?),
            Backend::Memory => match self.storage.quota_bytes {
                Some(quota) => Arc::new(InMemoryKeyValueStore::with_quota(quota)),
                None => Arc::new(InMemoryKeyValueStore::new()),
            },
        };
        Ok(kv)
    }
}
