//! CLI arguments and subcommands for procwarden.
//!
//! This module defines the command-line interface structure using the
//! clap library, including all flags and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procwarden",
    about = "Process monitor and controller for Linux",
    long_about = "Process monitor and controller for Linux.\n\n\
                  Scans the proc pseudo-filesystem for per-process memory, CPU, state, and \
                  priority, keeps a sliding memory history to flag suspected leaks, and can \
                  terminate, suspend, resume, and renice processes.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Refresh period for watch mode, in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Root of the process pseudo-filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Enable focus-mode prioritization in watch mode
    #[arg(long)]
    pub focus: bool,
}

/// Subcommands for one-shot queries and process control
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan once and print every visible process
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one process, including its retained memory history
    Show {
        pid: i32,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Periodically rescan and report changes until interrupted
    Watch,

    /// Terminate a process (SIGTERM, or SIGKILL with --force)
    Kill {
        pid: i32,

        /// Send SIGKILL instead of SIGTERM
        #[arg(long)]
        force: bool,
    },

    /// Pause a process with SIGSTOP
    Suspend { pid: i32 },

    /// Resume a stopped process with SIGCONT
    Resume { pid: i32 },

    /// Change a process's nice value (clamped to -20..=19)
    Renice {
        pid: i32,

        #[arg(allow_hyphen_values = true)]
        nice: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let args = Args::parse_from(["procwarden"]);
        assert!(args.command.is_none());
        assert!(!args.focus);
        assert!(args.interval_ms.is_none());
    }

    #[test]
    fn test_kill_parses_force_flag() {
        let args = Args::parse_from(["procwarden", "kill", "1234", "--force"]);
        match args.command {
            Some(Commands::Kill { pid, force }) => {
                assert_eq!(pid, 1234);
                assert!(force);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_renice_parses_negative_nice() {
        let args = Args::parse_from(["procwarden", "renice", "42", "-10"]);
        match args.command {
            Some(Commands::Renice { pid, nice }) => {
                assert_eq!(pid, 42);
                assert_eq!(nice, -10);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }
}
