//! Concurrent HTTP downloads streamed to disk.
//!
//! This module provides the batch pipeline: a [`Dispatcher`] feeding a
//! fixed-size worker pool, each worker running [`Fetcher`] then
//! [`StreamWriter`] per target, and a [`ResultCollector`] printing outcomes as
//! they arrive.
//!
//! # Features
//!
//! - Bounded concurrency with one work unit per target
//! - Per-target failure isolation (a failing URL never stops the batch)
//! - Streaming writes with determinate or indeterminate progress
//! - Cooperative cancellation through a [`CancellationToken`](tokio_util::sync::CancellationToken)
//!
//! # Example
//!
//! ```no_run
//! use dazai_core::download::{Fetcher, StreamWriter, Target, TargetDownloader};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = TargetDownloader::new(Fetcher::new()?, StreamWriter::default());
//! let saved = downloader
//!     .try_download(&Target::new("https://example.com/file.iso"), &CancellationToken::new())
//!     .await?;
//! println!("Downloaded: {}", saved.path.display());
//! # Ok(())
//! # }
//! ```

mod collector;
mod constants;
mod dispatcher;
mod error;
mod fetcher;
pub mod naming;
mod outcome;
pub mod progress;
mod queue;
mod worker;
mod writer;

pub use collector::{ResultCollector, format_outcome, format_summary};
pub use constants::{
    DEFAULT_POOL_SIZE, FETCH_TIMEOUT, FETCH_TIMEOUT_SECS, INDETERMINATE_PROGRESS_UNITS,
    MAX_POOL_SIZE, MIN_POOL_SIZE,
};
pub use dispatcher::{Dispatcher, NO_TARGETS_MESSAGE, START_BANNER};
pub use error::{DispatchError, DownloadError, NamingError};
pub use fetcher::{ACCEPTED_STATUSES, FetchOutcome, Fetcher, classify_status};
pub use naming::{DestinationNamer, DirectoryResolver, OutputDirectory, PromptNamer, UrlNamer};
pub use outcome::{
    CompletedTarget, DownloadOutcome, FailedTarget, OutcomeStatus, RunSummary, Target, WorkUnit,
};
pub use progress::{
    IndeterminateProgress, NoProgress, ProgressMode, ProgressReporter, TerminalProgress,
    TransferProgress,
};
pub use queue::{WorkReceiver, WorkSender, work_queue};
pub use worker::{SavedFile, TargetDownloader};
pub use writer::StreamWriter;
