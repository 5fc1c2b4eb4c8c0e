use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::config::{DEFAULT_IDLE_TIMEOUT, ZipFsConfig};

#[derive(Parser, Debug)]
#[command(name = "zipvfs")]
#[command(version)]
#[command(about = "Browse and read a ZIP archive without extracting it", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipvfs app.zip ls lib             list the lib directory of app.zip\n  \
  zipvfs app cat lib/main.js        print a file (.zip is appended when missing)\n  \
  zipvfs app.zip exists a/b.txt     exit status 1 if a/b.txt is absent")]
pub struct Cli {
    /// ZIP archive path
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    #[command(subcommand)]
    pub command: Command,

    /// Release the archive descriptor after this many idle milliseconds
    #[arg(long, value_name = "MS")]
    pub idle_timeout_ms: Option<u64>,

    /// More log output (-vv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode, errors only
    #[arg(short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory (default: archive root)
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Write a file to stdout
    Cat {
        path: String,
        /// Decode as text with this encoding (utf8, utf16le, latin1, ascii, hex)
        #[arg(short, long)]
        encoding: Option<String>,
    },
    /// Show type, size and modification time
    Stat { path: String },
    /// Exit with status 0 if the path exists, 1 otherwise
    Exists { path: String },
    /// Recursive listing with sizes and timestamps
    Tree {
        #[arg(default_value = "")]
        path: String,
    },
}

impl Cli {
    pub fn config(&self) -> ZipFsConfig {
        let idle = self
            .idle_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_IDLE_TIMEOUT);
        ZipFsConfig::default().with_idle_timeout(idle)
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
