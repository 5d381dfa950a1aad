//! CLI command routing: maps parse results and subcommands to handlers.
//!
//! Argument problems that clap cannot express (a missing `-u`, `add` without
//! `--all`) are reported here with a usage hint and their own exit code.

use anyhow::Result;
use clap::error::ErrorKind;
use dazai_core::download::NO_TARGETS_MESSAGE;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ProcessExit;
use crate::app::download_orchestrator;
use crate::cli::{AddArgs, Cli, Command, GetArgs, USAGE};

/// Printed after clap's own message for an unknown subcommand.
pub(crate) const AVAILABLE_COMMANDS: &str = "Available commands: get, add, env";

const GET_HINT: &str = "Use -u to provide the URL to download.\nUsage: dazai get -u <URL>";

const ADD_HINT: &str =
    "Use --all to list the URLs to download.\nUsage: dazai add --all <URL1> <URL2> ...";

/// Prints a clap error and picks the exit outcome for it.
pub(crate) fn parse_error_exit(error: &clap::Error) -> ProcessExit {
    if let Err(e) = error.print() {
        debug!(error = %e, "cannot print argument error");
    }
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ProcessExit::Success,
        ErrorKind::InvalidSubcommand => {
            eprintln!("{AVAILABLE_COMMANDS}");
            ProcessExit::Usage
        }
        _ => ProcessExit::Usage,
    }
}

/// Runs the selected subcommand.
pub(crate) async fn dispatch(cli: &Cli, cancel: &CancellationToken) -> Result<ProcessExit> {
    let Some(command) = &cli.command else {
        println!("{USAGE}");
        return Ok(ProcessExit::Failure);
    };

    match command {
        Command::Get(args) => {
            let Some(url) = requested_url(args) else {
                println!("{GET_HINT}");
                return Ok(ProcessExit::Usage);
            };
            download_orchestrator::run_get(cli, url, cancel).await
        }
        Command::Add(args) => match batch_targets(args) {
            Ok(urls) => {
                debug!(targets = urls.len(), "batch targets collected");
                download_orchestrator::run_add(cli, urls, cancel).await
            }
            Err(exit) => Ok(exit),
        },
        Command::Env => {
            download_orchestrator::run_env(cli, cancel).await
        }
    }
}

fn requested_url(args: &GetArgs) -> Option<&str> {
    args.url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// URLs for `add`, or the exit outcome when they are missing.
fn batch_targets(args: &AddArgs) -> Result<Vec<String>, ProcessExit> {
    if args.all.is_empty() {
        if args.urls.is_empty() {
            println!("{NO_TARGETS_MESSAGE}");
            return Err(ProcessExit::Failure);
        }
        println!("{ADD_HINT}");
        return Err(ProcessExit::Usage);
    }
    Ok(args.targets())
}
