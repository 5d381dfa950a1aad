//! Transfer progress contract and its terminal rendering.
//!
//! The stream writer only ever reports cumulative byte counts through
//! [`TransferProgress::update`]. How those counts are drawn, and what is shown
//! when the total size is unknown, is decided here by [`ProgressMode`].

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::constants::INDETERMINATE_PROGRESS_UNITS;
use super::outcome::Target;

/// Presentation used when the server does not announce a content length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndeterminateProgress {
    /// Draw a bar against a fixed unit count.
    FixedUnits(u64),
    /// Draw a spinner with the running byte count.
    Spinner,
}

impl Default for IndeterminateProgress {
    fn default() -> Self {
        Self::FixedUnits(INDETERMINATE_PROGRESS_UNITS)
    }
}

/// How a single transfer's progress is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Total size is known.
    Determinate {
        /// Expected body size in bytes.
        total: u64,
    },
    /// Total size is unknown.
    Indeterminate(IndeterminateProgress),
}

impl ProgressMode {
    /// Picks determinate mode for a positive content length, otherwise the fallback.
    #[must_use]
    pub fn for_length(expected: Option<u64>, fallback: IndeterminateProgress) -> Self {
        match expected {
            Some(total) if total > 0 => Self::Determinate { total },
            _ => Self::Indeterminate(fallback),
        }
    }
}

/// Progress sink for one transfer.
pub trait TransferProgress: Send + Sync {
    /// Reports the cumulative number of bytes transferred so far.
    fn update(&self, transferred: u64);

    /// Marks the transfer as complete.
    fn finish(&self);

    /// Marks the transfer as failed.
    fn abandon(&self);
}

/// Creates one progress sink per transfer.
pub trait ProgressReporter: Send + Sync {
    /// Starts tracking a transfer for `target`.
    fn begin(&self, target: &Target, mode: ProgressMode) -> Box<dyn TransferProgress>;
}

/// Reporter that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn update(&self, _transferred: u64) {}
    fn finish(&self) {}
    fn abandon(&self) {}
}

impl ProgressReporter for NoProgress {
    fn begin(&self, _target: &Target, _mode: ProgressMode) -> Box<dyn TransferProgress> {
        Box::new(NoProgress)
    }
}

/// Terminal reporter drawing one indicatif bar per active transfer on stderr.
#[derive(Debug, Clone)]
pub struct TerminalProgress {
    multi: MultiProgress,
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalProgress {
    /// Creates a reporter drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
        }
    }

    /// Creates a reporter that tracks bars without drawing them.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }
}

impl ProgressReporter for TerminalProgress {
    fn begin(&self, target: &Target, mode: ProgressMode) -> Box<dyn TransferProgress> {
        let (bar, template, units) = match mode {
            ProgressMode::Determinate { total } => (
                ProgressBar::new(total),
                "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                None,
            ),
            ProgressMode::Indeterminate(IndeterminateProgress::FixedUnits(units)) => (
                ProgressBar::new(units),
                "{msg} [{bar:30}] {bytes} (size unknown)",
                Some(units),
            ),
            ProgressMode::Indeterminate(IndeterminateProgress::Spinner) => (
                ProgressBar::new_spinner(),
                "{spinner} {msg} {bytes} ({bytes_per_sec})",
                None,
            ),
        };
        let bar = self.multi.add(bar);
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(target.to_string());
        if matches!(
            mode,
            ProgressMode::Indeterminate(IndeterminateProgress::Spinner)
        ) {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        Box::new(BarProgress { bar, units })
    }
}

struct BarProgress {
    bar: ProgressBar,
    units: Option<u64>,
}

impl TransferProgress for BarProgress {
    fn update(&self, transferred: u64) {
        // Fixed-unit bars grow once the byte count passes the placeholder length.
        if let Some(units) = self.units {
            self.bar.set_length(units.max(transferred));
        }
        self.bar.set_position(transferred);
    }

    fn finish(&self) {
        self.bar.finish();
    }

    fn abandon(&self) {
        self.bar.abandon();
    }
}
