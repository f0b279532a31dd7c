//! KoSync CLI
//!
//! Keeps an e-reader's book directory in step with a KoSync server.
//!
//! # Commands
//!
//! - `sync` - Download every book the server has that the device lacks
//! - `scan` - List the books found in the library directory
//! - `config` - Show the effective settings
//! - `version` - Show version information

mod commands;
mod config;
mod hook;

use clap::{Parser, Subcommand};
use config::Settings;
use kosync_engine::DownloadPolicy;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sync an e-reader library with a KoSync server.
#[derive(Parser)]
#[command(name = "kosync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (defaults to .kosyncConfig.json next to the binary)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download missing books from the server
    Sync {
        /// Keep going after a failed download instead of stopping
        #[arg(long)]
        continue_on_error: bool,

        /// Command to run when new books arrived, e.g. `--on-change nickel-refresh`
        #[arg(long, value_name = "COMMAND", num_args = 1..)]
        on_change: Vec<String>,
    },

    /// List the books in the library directory
    Scan {
        /// Library directory (defaults to BooksDirectory from the config)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the effective settings
    Config,

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", error_chain(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// Joins an error with its causes, skipping causes already in the message.
fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message = format!("{message}: {text}");
        }
        source = cause.source();
    }
    message
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let Cli { config, command, .. } = cli;
    let config_path = || match &config {
        Some(path) => Ok(path.clone()),
        None => Settings::default_path(),
    };

    match command {
        Commands::Sync {
            continue_on_error,
            on_change,
        } => {
            let settings = Settings::load_or_create(&config_path()?)?;
            let policy = if continue_on_error {
                DownloadPolicy::Continue
            } else {
                DownloadPolicy::FailFast
            };
            commands::sync::run(&settings, policy, &on_change)?;
        }
        Commands::Scan { dir, format } => {
            let dir = match dir {
                Some(dir) => dir,
                None => Settings::load_or_create(&config_path()?)?.books_directory,
            };
            commands::scan::run(&dir, &format)?;
        }
        Commands::Config => {
            let path = config_path()?;
            let settings = Settings::load_or_create(&path)?;
            commands::config::run(&path, &settings)?;
        }
        Commands::Version => {
            println!("KoSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Wire protocol: POST {}", kosync_protocol::SYNC_PATH);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn error_chain_skips_repeated_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = config::ConfigError::Io {
            path: PathBuf::from("/tmp/x.json"),
            source: io,
        };
        assert_eq!(
            error_chain(&err),
            "cannot access config file /tmp/x.json: no such file"
        );
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "kosync",
            "--config",
            "/tmp/kosync.json",
            "sync",
            "--continue-on-error",
            "--on-change",
            "notify",
            "books",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/kosync.json")));
        match cli.command {
            Commands::Sync {
                continue_on_error,
                on_change,
            } => {
                assert!(continue_on_error);
                assert_eq!(on_change, vec!["notify".to_string(), "books".to_string()]);
            }
            _ => panic!("expected sync"),
        }
    }
}
