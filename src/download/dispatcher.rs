//! Dispatcher for batch downloads with a fixed-size worker pool.
//!
//! # Overview
//!
//! [`Dispatcher::run`] turns each target into one [`WorkUnit`], feeds the
//! units through a bounded [`work_queue`], and starts `pool_size` workers
//! plus a [`ResultCollector`]. Workers are tokio tasks on the multi-threaded
//! runtime, so they execute in parallel. Every target yields exactly one
//! outcome; a failing target never stops the pool.
//!
//! # Example
//!
//! ```no_run
//! use dazai_core::config::DispatchConfig;
//! use dazai_core::download::{Dispatcher, Target};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::from_config(DispatchConfig::default().with_pool_size(4))?;
//! let targets = vec![Target::new("https://example.com/a.iso")];
//! let summary = dispatcher.run(targets, &CancellationToken::new()).await?;
//! println!("{} succeeded, {} failed", summary.succeeded(), summary.failed());
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::collector::ResultCollector;
use super::constants::{RESULT_QUEUE_CAPACITY, WORK_QUEUE_CAPACITY};
use super::error::DispatchError;
use super::outcome::{RunSummary, Target, WorkUnit};
use super::queue::work_queue;
use super::worker::{TargetDownloader, run_worker};
use crate::config::DispatchConfig;

/// Message printed when a run is started without targets.
pub const NO_TARGETS_MESSAGE: &str =
    "No URLs provided. Please provide URLs as command line arguments.";

/// Banner printed when a run starts.
pub const START_BANNER: &str = "Starting..... ";

/// Coordinates one batch run over a fixed-size worker pool.
#[derive(Debug)]
pub struct Dispatcher {
    pool_size: usize,
    downloader: Arc<TargetDownloader>,
}

impl Dispatcher {
    /// Creates a dispatcher around a configured downloader.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidPoolSize`] outside 1..=100.
    #[instrument(level = "debug", skip(downloader))]
    pub fn new(config: &DispatchConfig, downloader: TargetDownloader) -> Result<Self, DispatchError> {
        config.validate()?;
        debug!(
            pool_size = config.pool_size,
            timeout_secs = config.fetch_timeout.as_secs(),
            "creating dispatcher"
        );
        Ok(Self {
            pool_size: config.pool_size,
            downloader: Arc::new(downloader),
        })
    }

    /// Creates a dispatcher with default collaborators (URL-derived names,
    /// working directory, no progress bars).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for an invalid pool size or HTTP client.
    pub fn from_config(config: DispatchConfig) -> Result<Self, DispatchError> {
        let downloader = TargetDownloader::from_config(&config)?;
        Self::new(&config, downloader)
    }

    /// Returns the number of workers started per run.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Runs the batch, printing results to stdout.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Collector`] if the collector task dies.
    /// Per-target failures are reported in the summary, never as errors.
    pub async fn run(
        &self,
        targets: Vec<Target>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, DispatchError> {
        let (summary, _) = self
            .run_with_output(targets, cancel, std::io::stdout())
            .await?;
        Ok(summary)
    }

    /// Runs the batch, printing the banner and results to `out`.
    ///
    /// Returns once every worker has finished and the collector has drained
    /// every outcome. An empty target list starts no workers and yields an
    /// empty summary.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Collector`] if the collector task dies.
    #[instrument(skip(self, targets, cancel, out), fields(targets = targets.len(), pool_size = self.pool_size))]
    pub async fn run_with_output<W>(
        &self,
        targets: Vec<Target>,
        cancel: &CancellationToken,
        mut out: W,
    ) -> Result<(RunSummary, W), DispatchError>
    where
        W: Write + Send + 'static,
    {
        if targets.is_empty() {
            info!("no targets supplied, nothing to dispatch");
            print_line(&mut out, NO_TARGETS_MESSAGE);
            return Ok((RunSummary::new(), out));
        }

        print_line(&mut out, START_BANNER);
        let unit_count = targets.len();
        info!(units = unit_count, workers = self.pool_size, "starting dispatch");

        let (work_tx, work_rx) = work_queue(unit_count.min(WORK_QUEUE_CAPACITY));
        let (result_tx, result_rx) = mpsc::channel(RESULT_QUEUE_CAPACITY);

        let collector = tokio::spawn(ResultCollector::new(out).drain(result_rx));

        let mut workers = JoinSet::new();
        for id in 1..=self.pool_size {
            workers.spawn(run_worker(
                id,
                Arc::clone(&self.downloader),
                work_rx.clone(),
                result_tx.clone(),
                cancel.clone(),
            ));
        }
        // Workers hold the only remaining handles; the collector stops when they exit.
        drop(result_tx);
        drop(work_rx);

        for (id, target) in targets.into_iter().enumerate() {
            if let Err(unit) = work_tx.send(WorkUnit::single(id, target)).await {
                warn!(unit = unit.id, "all workers exited before the queue was filled");
                break;
            }
        }
        work_tx.close();
        debug!("work queue closed");

        let mut delivered = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(sent) => delivered += sent,
                Err(e) => warn!(error = %e, "worker task panicked"),
            }
        }
        debug!(delivered, "all workers finished");

        let (summary, out) = collector
            .await
            .map_err(|e| DispatchError::Collector(e.to_string()))?;
        Ok((summary, out))
    }
}

fn print_line<W: Write>(out: &mut W, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        debug!(error = %e, "cannot write status line");
    }
}
