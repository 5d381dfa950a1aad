//! Worker loop and the per-target fetch → name → write pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{DispatchError, DownloadError, NamingError};
use super::fetcher::Fetcher;
use super::naming::{DestinationNamer, DirectoryResolver, OutputDirectory, UrlNamer};
use super::outcome::{DownloadOutcome, Target, WorkUnit};
use super::progress::{NoProgress, ProgressReporter};
use super::queue::WorkReceiver;
use super::writer::StreamWriter;
use crate::config::DispatchConfig;

/// A file successfully written for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes_written: u64,
}

/// Serializes writes that resolve to the same destination path.
///
/// An entry lives only while some task holds or waits for its lock.
#[derive(Debug, Default)]
struct PathLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PathLocks {
    async fn lock(&self, path: &Path) -> PathGuard<'_> {
        let lock = Arc::clone(self.locks.entry(path.to_path_buf()).or_default().value());
        PathGuard {
            locks: self,
            path: path.to_path_buf(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Held while writing one destination; releases and prunes its entry on drop.
struct PathGuard<'a> {
    locks: &'a PathLocks,
    path: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own handle left: nobody holds or waits for this path.
        self.locks
            .locks
            .remove_if(&self.path, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Downloads a single target: fetch, resolve the destination, stream to disk.
///
/// Shared by every worker of a run and by the single-download commands.
pub struct TargetDownloader {
    fetcher: Fetcher,
    writer: StreamWriter,
    namer: Arc<dyn DestinationNamer>,
    directory: Arc<dyn DirectoryResolver>,
    reporter: Arc<dyn ProgressReporter>,
    path_locks: PathLocks,
}

impl std::fmt::Debug for TargetDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetDownloader")
            .field("fetcher", &self.fetcher)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

impl TargetDownloader {
    /// Creates a downloader naming files from their URL, saving into the
    /// working directory, without progress output.
    #[must_use]
    pub fn new(fetcher: Fetcher, writer: StreamWriter) -> Self {
        Self {
            fetcher,
            writer,
            namer: Arc::new(UrlNamer),
            directory: Arc::new(OutputDirectory::Working),
            reporter: Arc::new(NoProgress),
            path_locks: PathLocks::default(),
        }
    }

    /// Creates a downloader from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let fetcher = Fetcher::with_timeout(config.fetch_timeout)?;
        Ok(Self::new(
            fetcher,
            StreamWriter::new(config.indeterminate_progress),
        ))
    }

    /// Replaces the naming collaborator.
    #[must_use]
    pub fn with_namer(mut self, namer: Arc<dyn DestinationNamer>) -> Self {
        self.namer = namer;
        self
    }

    /// Replaces the directory collaborator.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryResolver>) -> Self {
        self.directory = directory;
        self
    }

    /// Replaces the progress reporter.
    #[must_use]
    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runs the whole pipeline for `target` and tags the result.
    pub async fn download(&self, target: Target, cancel: &CancellationToken) -> DownloadOutcome {
        match self.try_download(&target, cancel).await {
            Ok(saved) => DownloadOutcome::succeeded(target, saved.path, saved.bytes_written),
            Err(cause) => DownloadOutcome::failed(target, cause),
        }
    }

    /// Runs the whole pipeline for `target`.
    ///
    /// The destination is only resolved once the fetch has been accepted, so
    /// the user is never asked to name a file that will not arrive.
    ///
    /// # Errors
    ///
    /// Returns the first [`DownloadError`] raised by any stage.
    #[instrument(skip(self, cancel), fields(url = %target))]
    pub async fn try_download(
        &self,
        target: &Target,
        cancel: &CancellationToken,
    ) -> Result<SavedFile, DownloadError> {
        if cancel.is_cancelled() {
            return Err(DownloadError::cancelled(target.url()));
        }

        let fetched = self.fetcher.fetch(target, cancel).await?;
        let content_length = fetched.content_length();

        // The prompt may block on stdin indefinitely; cancellation must not wait for it.
        let path = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(target.url())),
            resolved = self.resolve_destination(target) => {
                resolved.map_err(|e| DownloadError::naming(target.url(), e))?
            }
        };

        let _guard = self.path_locks.lock(&path).await;
        debug!(path = %path.display(), "writing destination");
        let bytes_written = self
            .writer
            .write(
                target,
                fetched.into_body_stream(),
                &path,
                content_length,
                self.reporter.as_ref(),
                cancel,
            )
            .await?;

        info!(path = %path.display(), bytes = bytes_written, "download complete");
        Ok(SavedFile {
            path,
            bytes_written,
        })
    }

    /// Asks the collaborators for name and directory on the blocking pool.
    async fn resolve_destination(&self, target: &Target) -> Result<PathBuf, NamingError> {
        let namer = Arc::clone(&self.namer);
        let directory = Arc::clone(&self.directory);
        let target = target.clone();

        tokio::task::spawn_blocking(move || {
            let name = namer.name_for(&target)?;
            let dir = directory.resolve()?;
            Ok(dir.join(name))
        })
        .await
        .map_err(|e| NamingError::Interrupted(e.to_string()))?
    }
}

/// Pulls units until the queue is closed and drained, sending one outcome
/// per target. Returns the number of outcomes sent.
pub(crate) async fn run_worker(
    id: usize,
    downloader: Arc<TargetDownloader>,
    queue: WorkReceiver<WorkUnit>,
    results: mpsc::Sender<DownloadOutcome>,
    cancel: CancellationToken,
) -> usize {
    let mut sent = 0;
    while let Some(unit) = queue.recv().await {
        debug!(worker = id, unit = unit.id, "took work unit");
        for target in unit.targets {
            let outcome = downloader.download(target, &cancel).await;
            if results.send(outcome).await.is_err() {
                warn!(worker = id, "result queue closed, stopping worker");
                return sent;
            }
            sent += 1;
        }
    }
    debug!(worker = id, sent, "worker finished");
    sent
}
