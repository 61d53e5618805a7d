//! Command-line interface for flightplan-ingest.
//!
//! This module provides the CLI structure for the `fpingest` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, IngestCommand, ParseCommand, StatusCommand, UploadCommand};

use crate::logging::Verbosity;

/// fpingest - Load SHR/IARR flight-plan telegrams into a message store
///
/// Reads a delimited export of the upload sheet, parses each SHR telegram
/// with its IARR companion and stores the valid flight events.
#[derive(Debug, Parser)]
#[command(name = "fpingest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a sheet export and print the batch report
    Ingest(IngestCommand),

    /// Parse one telegram pair and print the message
    Parse(ParseCommand),

    /// Show message store statistics
    Status(StatusCommand),

    /// Show an upload ledger entry
    Upload(UploadCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
