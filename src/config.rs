//! Run configuration.
//!
//! [`DispatchConfig`] is built once (from CLI flags in the binary) and passed
//! into the dispatcher; nothing below it reads process arguments or the
//! environment. [`EnvConfig`] backs the environment-driven single download.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::download::{
    DEFAULT_POOL_SIZE, DispatchError, FETCH_TIMEOUT, IndeterminateProgress, MAX_POOL_SIZE,
    MIN_POOL_SIZE,
};

/// Environment variable naming the storage directory.
pub const STORAGE_DIR_VAR: &str = "Local_Storage";

/// Environment variable naming the URL to download.
pub const DOWNLOAD_URL_VAR: &str = "Download_url";

/// Settings for one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of concurrent workers.
    pub pool_size: usize,
    /// Per-request timeout.
    pub fetch_timeout: Duration,
    /// Progress presentation when the content length is unknown.
    pub indeterminate_progress: IndeterminateProgress,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            fetch_timeout: FETCH_TIMEOUT,
            indeterminate_progress: IndeterminateProgress::default(),
        }
    }
}

impl DispatchConfig {
    /// Sets the pool size.
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the indeterminate-progress strategy.
    #[must_use]
    pub fn with_indeterminate_progress(mut self, strategy: IndeterminateProgress) -> Self {
        self.indeterminate_progress = strategy;
        self
    }

    /// Checks the pool size range.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidPoolSize`] outside 1..=100.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if !(MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&self.pool_size) {
            return Err(DispatchError::InvalidPoolSize {
                value: self.pool_size,
            });
        }
        Ok(())
    }
}

/// Errors loading the environment-driven configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    /// The `.env` file exists but could not be parsed.
    #[error("cannot load .env file: {0}")]
    DotEnv(#[source] dotenvy::Error),
}

/// Storage directory and URL for the environment-driven download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Directory the file is saved into; created if absent.
    pub storage_dir: PathBuf,
    /// URL to download.
    pub download_url: String,
}

impl EnvConfig {
    /// Loads `.env` from the working directory (if present), then reads the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DotEnv`] for a malformed `.env` file and
    /// [`ConfigError::Missing`] when either variable is unset.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => debug!("no .env file found"),
            Err(e) => return Err(ConfigError::DotEnv(e)),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when either variable is unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        Ok(Self {
            storage_dir: PathBuf::from(read(STORAGE_DIR_VAR)?),
            download_url: read(DOWNLOAD_URL_VAR)?,
        })
    }
}
