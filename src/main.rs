//! CLI entry point for the dazai download tool.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app;
mod cli;

use app::{command_dispatcher, download_orchestrator, exit_handler, terminal};
use cli::Cli;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested succeeded.
    Success,
    /// Nothing succeeded, or nothing was requested.
    Failure,
    /// The command line was incomplete or malformed.
    Usage,
    /// Some targets of a batch failed.
    Partial,
    /// A second interrupt arrived while cancelling.
    Interrupted,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Usage => 2,
            Self::Partial => 3,
            Self::Interrupted => 130,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse before tracing so --help and usage errors stay free of log output
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return Ok(command_dispatcher::parse_error_exit(&e).into()),
    };

    let no_color =
        terminal::should_disable_color(terminal::no_color_env_requested(), terminal::is_dumb_terminal());
    terminal::init_tracing(terminal::default_log_level(cli.verbose, cli.quiet), no_color);
    debug!(?cli, "CLI arguments parsed");

    let cancel = download_orchestrator::cancel_on_interrupt();
    let result = command_dispatcher::dispatch(&cli, &cancel).await;
    if cancel.is_cancelled() {
        // A save-as prompt may still be blocked on stdin; runtime shutdown would wait for it.
        exit_handler::exit_now(&result);
    }
    Ok(result?.into())
}
