//! Streams a response body to a file on disk.

use std::path::Path;
use std::pin::pin;

use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::error::DownloadError;
use super::outcome::Target;
use super::progress::{IndeterminateProgress, ProgressMode, ProgressReporter, TransferProgress};

/// Copies byte streams into files, reporting progress as it goes.
///
/// Existing files are truncated. A failed copy leaves the partial file on
/// disk; nothing is cleaned up.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamWriter {
    fallback: IndeterminateProgress,
}

enum Interrupt {
    Io(std::io::Error),
    Cancelled,
}

impl StreamWriter {
    /// Creates a writer using `fallback` when the expected length is unknown.
    #[must_use]
    pub fn new(fallback: IndeterminateProgress) -> Self {
        Self { fallback }
    }

    /// Returns the indeterminate-progress strategy.
    #[must_use]
    pub fn fallback(&self) -> IndeterminateProgress {
        self.fallback
    }

    /// Creates `destination` and copies `stream` into it in a single pass.
    ///
    /// The stream is taken by value and dropped before this returns, whatever
    /// the exit path.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Filesystem`] if the file cannot be created
    /// - [`DownloadError::Timeout`] if the stream reports a timeout mid-copy
    /// - [`DownloadError::StreamCopy`] if reading or writing fails mid-copy,
    ///   carrying the bytes written so far
    /// - [`DownloadError::Cancelled`] if `cancel` fires during the copy
    #[instrument(skip(self, stream, reporter, cancel), fields(url = %target, path = %destination.display()))]
    pub async fn write<S, B>(
        &self,
        target: &Target,
        stream: S,
        destination: &Path,
        expected_length: Option<u64>,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>
    where
        S: Stream<Item = std::io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let file = File::create(destination)
            .await
            .map_err(|e| DownloadError::filesystem(destination, e))?;

        let progress = reporter.begin(target, ProgressMode::for_length(expected_length, self.fallback));
        let (bytes_written, interrupt) = copy_stream(stream, file, progress.as_ref(), cancel).await;

        match interrupt {
            None => {
                progress.finish();
                debug!(bytes = bytes_written, "stream written");
                Ok(bytes_written)
            }
            Some(Interrupt::Cancelled) => {
                progress.abandon();
                Err(DownloadError::cancelled(target.url()))
            }
            Some(Interrupt::Io(source)) if source.kind() == std::io::ErrorKind::TimedOut => {
                progress.abandon();
                warn!(bytes = bytes_written, "transfer timed out, partial file kept");
                Err(DownloadError::timeout(target.url(), bytes_written, source))
            }
            Some(Interrupt::Io(source)) => {
                progress.abandon();
                warn!(bytes = bytes_written, error = %source, "copy interrupted, partial file kept");
                Err(DownloadError::stream_copy(destination, bytes_written, source))
            }
        }
    }
}

/// Copies until the stream ends or fails, then flushes whatever was buffered.
async fn copy_stream<S, B>(
    stream: S,
    file: File,
    progress: &dyn TransferProgress,
    cancel: &CancellationToken,
) -> (u64, Option<Interrupt>)
where
    S: Stream<Item = std::io::Result<B>>,
    B: AsRef<[u8]>,
{
    let mut writer = BufWriter::new(file);
    let mut stream = pin!(stream);
    let mut bytes_written: u64 = 0;

    let mut interrupt = loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break Some(Interrupt::Cancelled),
            next = stream.next() => next,
        };
        let chunk = match next {
            None => break None,
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => break Some(Interrupt::Io(e)),
        };
        let chunk = chunk.as_ref();
        if let Err(e) = writer.write_all(chunk).await {
            break Some(Interrupt::Io(e));
        }
        bytes_written += chunk.len() as u64;
        progress.update(bytes_written);
    };

    // Partial content is flushed too, so it stays on disk after a failure.
    if let Err(e) = writer.flush().await
        && interrupt.is_none()
    {
        interrupt = Some(Interrupt::Io(e));
    }

    (bytes_written, interrupt)
}
