//! Dazai Core Library
//!
//! This library provides the core functionality for the `dazai` download
//! tool: fetching one or many URLs over HTTP in parallel and streaming each
//! response body to disk with progress reporting.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Run configuration and environment loading
//! - [`download`] - Fetcher, stream writer, worker pool, dispatcher and collector

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;

// Re-export commonly used types
pub use config::{ConfigError, DispatchConfig, EnvConfig};
pub use download::{
    DEFAULT_POOL_SIZE, DispatchError, Dispatcher, DownloadError, DownloadOutcome, Fetcher,
    RunSummary, StreamWriter, Target, TargetDownloader,
};
