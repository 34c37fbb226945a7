//! Logging configuration for the mega-deploy CLI tool.
//!
//! Progress of a run is reported through `tracing` at INFO level, so the default filter shows
//! every deployment and injection. The filter can be adjusted with:
//! - `-v/-vv` to include debug or trace output, `-q` to show only warnings and errors
//! - the `RUST_LOG` environment variable, which takes precedence over both
//! - `--log.file` to write logs to a file instead of stderr

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use super::{DeployCmdError, Result};

/// Logging configuration arguments.
#[derive(Debug, Clone, Default, Parser)]
pub struct LogArgs {
    /// Increase logging verbosity (-v = debug, -vv = trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Log file path. If specified, logs are written to this file instead of stderr.
    #[arg(long = "log.file", visible_aliases = ["log-file"], global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable colorful console logging. Only applies when logging to stderr (no --log.file).
    #[arg(long = "log.no-color", visible_aliases = ["log-no-color"], global = true)]
    pub log_no_color: bool,
}

impl LogArgs {
    /// The level applied to this tool's own crates when `RUST_LOG` is not set.
    pub fn level(&self) -> Level {
        if self.quiet {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Initialize the tracing subscriber based on the logging configuration.
    ///
    /// Log target is only shown for DEBUG level and above.
    pub fn init(&self) -> Result<()> {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            let level = self.level();
            EnvFilter::new(format!("mega_deploy={level},mega_deployer={level}"))
        };
        let show_target = self.verbose >= 1;

        if let Some(ref log_file) = self.log_file {
            // Log files never carry ANSI colors
            let file = std::fs::File::create(log_file).map_err(|source| {
                DeployCmdError::FileWrite { file: log_file.display().to_string(), source }
            })?;
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(file)
                .with_ansi(false)
                .init();
        } else {
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .with_ansi(!self.log_no_color)
                .init();
        }
        Ok(())
    }
}
