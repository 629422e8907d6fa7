use std::env;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::Cli;
use crate::db::DEFAULT_MAX_CONNECTIONS;
use crate::error::{AppError, AppResult};
use crate::expiry::DEFAULT_EXPIRING_WINDOW_DAYS;
use crate::store::DEFAULT_STORAGE_FILE;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://certificates.db";

/// Runtime configuration.
///
/// Built from the environment (optionally via `.env`), then overridden by
/// whatever flags were given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub storage_path: PathBuf,
    pub database_url: String,
    pub expiring_days: i64,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Json,
    Sqlite,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Json,
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            expiring_days: DEFAULT_EXPIRING_WINDOW_DAYS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Every key is optional.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("CERT_TRACKER_BACKEND") {
            config.backend = match value.to_ascii_lowercase().as_str() {
                "json" => Backend::Json,
                "sqlite" => Backend::Sqlite,
                other => {
                    return Err(AppError::config(format!(
                        "Invalid CERT_TRACKER_BACKEND: {}",
                        other
                    )))
                }
            };
        }

        if let Some(value) = lookup("CERT_TRACKER_STORAGE") {
            config.storage_path = PathBuf::from(value);
        }

        if let Some(value) = lookup("DATABASE_URL") {
            config.database_url = value;
        }

        if let Some(value) = lookup("CERT_TRACKER_EXPIRING_DAYS") {
            config.expiring_days = value
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or_else(|| {
                    AppError::config("CERT_TRACKER_EXPIRING_DAYS must be a non-negative number")
                })?;
        }

        if let Some(value) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::config("DB_MAX_CONNECTIONS must be a positive number"))?;
        }

        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(backend) = cli.backend {
            self.backend = backend;
        }
        if let Some(path) = &cli.storage {
            self.storage_path = path.clone();
        }
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
            // A database URL on the command line only makes sense for SQLite.
            if cli.backend.is_none() {
                self.backend = Backend::Sqlite;
            }
        } else if let (Backend::Sqlite, Some(path)) = (self.backend, &cli.storage) {
            // On sqlite, --storage names the database file.
            self.database_url = format!("sqlite://{}", path.display());
        }
        self
    }
}
