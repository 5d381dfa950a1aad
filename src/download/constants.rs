//! Constants for the download module (timeouts, pool sizing, progress).

use std::time::Duration;

/// Default HTTP request timeout (30 seconds), covering connect and body read.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Default request timeout as a [`Duration`].
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(FETCH_TIMEOUT_SECS);

/// Default number of concurrent workers.
pub const DEFAULT_POOL_SIZE: usize = 7;

/// Minimum allowed pool size.
pub const MIN_POOL_SIZE: usize = 1;

/// Maximum allowed pool size.
pub const MAX_POOL_SIZE: usize = 100;

/// Unit count used for indeterminate progress when the server omits Content-Length.
pub const INDETERMINATE_PROGRESS_UNITS: u64 = 1000;

/// Upper bound on the work queue buffer. Smaller batches size the queue to the unit count.
pub const WORK_QUEUE_CAPACITY: usize = 256;

/// Result queue buffer.
pub const RESULT_QUEUE_CAPACITY: usize = 64;
