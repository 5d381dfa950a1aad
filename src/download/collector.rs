//! Result collector: drains outcomes and prints them as they arrive.

use std::io::Write;

use indicatif::HumanBytes;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::outcome::{DownloadOutcome, OutcomeStatus, RunSummary};

/// Consumes the result queue until every sender is dropped.
#[derive(Debug)]
pub struct ResultCollector<W> {
    out: W,
    summary: RunSummary,
}

impl<W: Write> ResultCollector<W> {
    /// Creates a collector printing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            summary: RunSummary::new(),
        }
    }

    /// Drains `results` until the queue closes, printing one line per
    /// outcome followed by a totals line.
    pub async fn drain(mut self, mut results: mpsc::Receiver<DownloadOutcome>) -> (RunSummary, W) {
        while let Some(outcome) = results.recv().await {
            self.record(outcome);
        }
        self.finish()
    }

    /// Prints and tallies one outcome.
    pub fn record(&mut self, outcome: DownloadOutcome) {
        let line = format_outcome(&outcome);
        self.emit(&line);
        self.summary.record(outcome);
    }

    /// Prints the totals line and hands back the summary and writer.
    pub fn finish(mut self) -> (RunSummary, W) {
        let line = format_summary(&self.summary);
        self.emit(&line);
        info!(
            succeeded = self.summary.succeeded(),
            failed = self.summary.failed(),
            bytes = self.summary.bytes_written(),
            "run complete"
        );
        (self.summary, self.out)
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            debug!(error = %e, "cannot write result line");
        }
    }
}

/// One line describing an outcome.
#[must_use]
pub fn format_outcome(outcome: &DownloadOutcome) -> String {
    match &outcome.status {
        OutcomeStatus::Succeeded {
            path,
            bytes_written,
        } => format!(
            "[done] {} -> {} ({})",
            outcome.target,
            path.display(),
            HumanBytes(*bytes_written)
        ),
        OutcomeStatus::Failed { cause } => {
            format!("[failed] {} ({}): {cause}", outcome.target, cause.kind())
        }
    }
}

/// Totals line for a finished run.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "{} succeeded, {} failed, {} written",
        summary.succeeded(),
        summary.failed(),
        HumanBytes(summary.bytes_written())
    )
}
