//! Builds the download pipeline from CLI flags and runs the three download flows.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dazai_core::download::{
    DestinationNamer, DirectoryResolver, IndeterminateProgress, NoProgress, OutputDirectory,
    ProgressReporter, PromptNamer, TerminalProgress, UrlNamer,
};
use dazai_core::{DispatchConfig, Dispatcher, EnvConfig, Target, TargetDownloader};
use indicatif::HumanBytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{exit_handler, terminal};
use crate::cli::Cli;

/// Run settings derived from the global flags.
pub(crate) fn dispatch_config(cli: &Cli) -> DispatchConfig {
    let indeterminate = if cli.spinner {
        IndeterminateProgress::Spinner
    } else {
        IndeterminateProgress::default()
    };
    DispatchConfig::default()
        .with_pool_size(usize::from(cli.concurrency))
        .with_fetch_timeout(Duration::from_secs(cli.timeout))
        .with_indeterminate_progress(indeterminate)
}

/// Directory downloads go to: `--output-dir` if given, else the working directory.
pub(crate) fn output_directory(cli: &Cli) -> OutputDirectory {
    match &cli.output_dir {
        Some(path) => OutputDirectory::Fixed(path.clone()),
        None => OutputDirectory::Working,
    }
}

fn namer(cli: &Cli) -> Arc<dyn DestinationNamer> {
    if cli.name_from_url {
        Arc::new(UrlNamer)
    } else {
        Arc::new(PromptNamer::stdio())
    }
}

fn progress_reporter(cli: &Cli) -> Arc<dyn ProgressReporter> {
    let show = terminal::should_show_progress(
        std::io::stderr().is_terminal(),
        cli.quiet,
        cli.no_progress,
        terminal::is_dumb_terminal(),
    );
    if show {
        Arc::new(TerminalProgress::new())
    } else {
        Arc::new(NoProgress)
    }
}

/// Wires fetcher, writer and collaborators for one run. The directory is
/// checked up front: an unusable destination is a setup error.
fn build_downloader(
    cli: &Cli,
    config: &DispatchConfig,
    directory: OutputDirectory,
) -> Result<TargetDownloader> {
    let resolved = directory
        .resolve()
        .context("download directory is not usable")?;
    debug!(directory = %resolved.display(), "download directory ready");

    let downloader = TargetDownloader::from_config(config)
        .context("failed to initialize HTTP client")?
        .with_namer(namer(cli))
        .with_directory(Arc::new(directory))
        .with_progress(progress_reporter(cli));
    Ok(downloader)
}

/// Cancels the returned token on the first Ctrl-C and exits on the second.
pub(crate) fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupt received, cancelling downloads (press Ctrl-C again to exit now)");
        token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(i32::from(ProcessExit::Interrupted.code()));
        }
    });
    cancel
}

/// `get`: one URL, every failure fatal.
pub(crate) async fn run_get(cli: &Cli, url: &str, cancel: &CancellationToken) -> Result<ProcessExit> {
    let config = dispatch_config(cli);
    let downloader = build_downloader(cli, &config, output_directory(cli))?;
    download_one(&downloader, url, cancel).await
}

/// `add`: many URLs through the worker pool; exit code reflects the tally.
pub(crate) async fn run_add(
    cli: &Cli,
    urls: Vec<String>,
    cancel: &CancellationToken,
) -> Result<ProcessExit> {
    let config = dispatch_config(cli);
    let downloader = build_downloader(cli, &config, output_directory(cli))?;
    let dispatcher = Dispatcher::new(&config, downloader).context("invalid worker pool")?;

    let targets: Vec<Target> = urls.into_iter().map(Target::from).collect();
    let summary = dispatcher
        .run(targets, cancel)
        .await
        .context("batch run aborted")?;

    Ok(exit_handler::determine_exit_outcome(
        summary.succeeded(),
        summary.failed(),
    ))
}

/// `env`: the URL and directory come from `Download_url` and `Local_Storage`.
pub(crate) async fn run_env(cli: &Cli, cancel: &CancellationToken) -> Result<ProcessExit> {
    let env = EnvConfig::load().context("cannot read download settings from the environment")?;
    info!(
        url = %env.download_url,
        directory = %env.storage_dir.display(),
        "loaded environment download settings"
    );
    let config = dispatch_config(cli);
    let downloader = build_downloader(cli, &config, OutputDirectory::Created(env.storage_dir))?;
    download_one(&downloader, &env.download_url, cancel).await
}

async fn download_one(
    downloader: &TargetDownloader,
    url: &str,
    cancel: &CancellationToken,
) -> Result<ProcessExit> {
    let target = Target::new(url);
    let saved = downloader
        .try_download(&target, cancel)
        .await
        .with_context(|| format!("download of {target} failed"))?;
    println!(
        "Download completed: {} ({})",
        saved.path.display(),
        HumanBytes(saved.bytes_written)
    );
    Ok(ProcessExit::Success)
}
