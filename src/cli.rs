//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use dazai_core::{DEFAULT_POOL_SIZE, download::FETCH_TIMEOUT_SECS};

/// Usage text printed when no subcommand is given.
pub const USAGE: &str = "Expected the 'get', 'add' or 'env' subcommand
Usage:
  dazai get -u <URL>
  dazai add --all <URL1> <URL2> ...
  dazai env";

/// Fetch files over HTTP and save them to disk, one at a time or in parallel.
#[derive(Parser, Debug)]
#[command(name = "dazai")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress everything but errors and progress-free results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Number of concurrent download workers (1-100)
    #[arg(short = 'c', long, global = true, default_value_t = DEFAULT_POOL_SIZE as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Request timeout in seconds (1-3600)
    #[arg(short = 't', long, global = true, default_value_t = FETCH_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Directory to save files into (defaults to the working directory)
    #[arg(short = 'o', long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Name files after the last URL path segment instead of asking
    #[arg(long, global = true)]
    pub name_from_url: bool,

    /// Show a spinner instead of a placeholder bar when the size is unknown
    #[arg(long, global = true)]
    pub spinner: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a single file
    Get(GetArgs),
    /// Download multiple files at the same time
    Add(AddArgs),
    /// Download the URL in `Download_url` into `Local_Storage` (reads .env)
    Env,
}

/// Arguments for `get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// URL to download
    #[arg(short = 'u', long = "url", value_name = "URL")]
    pub url: Option<String>,
}

/// Arguments for `add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// URLs to download concurrently
    #[arg(long = "all", value_name = "URL", num_args = 1..)]
    pub all: Vec<String>,

    /// Additional URLs
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,
}

impl AddArgs {
    /// All URLs from `--all` followed by the positional ones.
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        self.all.iter().chain(&self.urls).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_subcommand_parses_to_none() {
        let cli = Cli::try_parse_from(["dazai"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.timeout, 30);
    }

    #[test]
    fn test_cli_get_with_url() {
        let cli = Cli::try_parse_from(["dazai", "get", "-u", "https://example.com/f"]).unwrap();
        match cli.command {
            Some(Command::Get(args)) => {
                assert_eq!(args.url.as_deref(), Some("https://example.com/f"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_get_without_url_leaves_it_unset() {
        let cli = Cli::try_parse_from(["dazai", "get"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Get(GetArgs { url: None }))));
    }

    #[test]
    fn test_cli_add_collects_all_and_positional_urls() {
        let cli = Cli::try_parse_from([
            "dazai",
            "add",
            "--all",
            "https://a.example/1",
            "https://a.example/2",
        ])
        .unwrap();
        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(
            args.targets(),
            vec!["https://a.example/1", "https://a.example/2"]
        );
        assert_eq!(cli.concurrency, 7);
    }

    #[test]
    fn test_cli_add_concurrency_range() {
        let cli = Cli::try_parse_from(["dazai", "add", "-c", "3", "--all", "u"]).unwrap();
        assert_eq!(cli.concurrency, 3);

        let err = Cli::try_parse_from(["dazai", "add", "-c", "0", "--all", "u"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = Cli::try_parse_from(["dazai", "add", "-c", "101", "--all", "u"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_add_positional_urls_without_all() {
        let cli = Cli::try_parse_from(["dazai", "add", "https://a.example/1"]).unwrap();
        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert!(args.all.is_empty());
        assert_eq!(args.urls, vec!["https://a.example/1"]);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dazai",
            "get",
            "-u",
            "https://example.com/f",
            "--timeout",
            "5",
            "--name-from-url",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.timeout, 5);
        assert!(cli.name_from_url);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let err = Cli::try_parse_from(["dazai", "--timeout", "0", "env"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_unknown_subcommand_is_invalid_subcommand() {
        let err = Cli::try_parse_from(["dazai", "fetch"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["dazai", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
