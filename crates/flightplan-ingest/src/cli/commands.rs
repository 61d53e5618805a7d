//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Ingest command arguments.
#[derive(Debug, Args)]
pub struct IngestCommand {
    /// Delimited export of the upload sheet
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Who submitted the sheet
    #[arg(short, long)]
    pub author: Option<String>,

    /// Output the report as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Parse command arguments.
#[derive(Debug, Args)]
pub struct ParseCommand {
    /// SHR telegram text
    pub shr: String,

    /// Companion IARR report
    #[arg(short, long)]
    pub iarr: Option<String>,

    /// Region label attached to the message
    #[arg(short, long, default_value = "")]
    pub region: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Upload command arguments.
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Upload ID printed by `ingest`
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration management commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: TestCommand,
    }

    #[derive(Debug, Subcommand)]
    enum TestCommand {
        Ingest(IngestCommand),
        Parse(ParseCommand),
        Upload(UploadCommand),
        #[command(subcommand)]
        Config(ConfigCommand),
    }

    #[test]
    fn test_ingest_command() {
        let cli = TestCli::try_parse_from(["test", "ingest", "june.csv", "-a", "ops", "--json"])
            .unwrap();
        let TestCommand::Ingest(cmd) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(cmd.file, PathBuf::from("june.csv"));
        assert_eq!(cmd.author.as_deref(), Some("ops"));
        assert!(cmd.json);
    }

    #[test]
    fn test_ingest_requires_file() {
        assert!(TestCli::try_parse_from(["test", "ingest"]).is_err());
    }

    #[test]
    fn test_parse_command_defaults() {
        let cli = TestCli::try_parse_from(["test", "parse", "SHR-RA1-ZZZZ0800"]).unwrap();
        let TestCommand::Parse(cmd) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(cmd.shr, "SHR-RA1-ZZZZ0800");
        assert!(cmd.iarr.is_none());
        assert_eq!(cmd.region, "");
    }

    #[test]
    fn test_parse_command_with_iarr() {
        let cli = TestCli::try_parse_from([
            "test",
            "parse",
            "SHR-RA1-ZZZZ0800",
            "--iarr",
            "ATA 0900",
            "-r",
            "Moscow",
        ])
        .unwrap();
        let TestCommand::Parse(cmd) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(cmd.iarr.as_deref(), Some("ATA 0900"));
        assert_eq!(cmd.region, "Moscow");
    }

    #[test]
    fn test_upload_command() {
        let cli = TestCli::try_parse_from(["test", "upload", "7", "-j"]).unwrap();
        let TestCommand::Upload(cmd) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(cmd.id, 7);
        assert!(cmd.json);
    }

    #[test]
    fn test_config_validate_with_file() {
        let cli =
            TestCli::try_parse_from(["test", "config", "validate", "-f", "/tmp/c.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            TestCommand::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
