//! Command-line argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::commands::Command;

/// zapret-ctl - controller for the zapret traffic-shaping executable
///
/// Builds the command line for the selected provider and mode, then starts,
/// watches and stops the executable.
#[derive(Parser, Debug)]
#[command(name = "zapret-ctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "ZAPRET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory containing bin/ and lists/ (default: next to this executable)
    #[arg(short = 'd', long, value_name = "DIR", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}
