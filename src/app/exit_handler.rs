//! Exit code logic for the dazai process.
//!
//! Single responsibility: map success/failure counts of a batch to the process exit outcome.

use std::io::Write;

use tracing::debug;

use crate::ProcessExit;

/// Determines the process exit outcome from succeeded and failed target counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Exit outcome of a run that ended early, printing the error if there was one.
pub(crate) fn interrupted_outcome(result: &anyhow::Result<ProcessExit>) -> ProcessExit {
    match result {
        Ok(exit) => *exit,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ProcessExit::Failure
        }
    }
}

/// Ends the process at once, without waiting for blocking tasks to return.
pub(crate) fn exit_now(result: &anyhow::Result<ProcessExit>) -> ! {
    let exit = interrupted_outcome(result);
    if let Err(e) = std::io::stdout().flush() {
        debug!(error = %e, "cannot flush stdout before exit");
    }
    std::process::exit(i32::from(exit.code()))
}
