//! `fpingest` - CLI for flightplan-ingest
//!
//! This binary loads sheet exports into the message store and inspects the
//! results.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use flightplan_ingest::cli::{
    Cli, Command, ConfigCommand, IngestCommand, ParseCommand, UploadCommand,
};
use flightplan_ingest::ingest::{BatchDispatcher, ColumnLayout, IngestReport};
use flightplan_ingest::source::RowSource;
use flightplan_ingest::storage::{SharedStorage, Storage};
use flightplan_ingest::{init_logging, telegram, Config, Error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Ingest(cmd) => handle_ingest(&config, cmd).await,
        Command::Parse(cmd) => handle_parse(&cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Upload(cmd) => handle_upload(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening message store {}", path.display()))
}

async fn handle_ingest(config: &Config, cmd: IngestCommand) -> anyhow::Result<()> {
    let rows = RowSource::from(&config.ingest).read_path(&cmd.file)?;
    let row_count = rows.len();

    let storage = SharedStorage::new(open_storage(config)?);
    let dispatcher = BatchDispatcher::new(storage, ColumnLayout::from(&config.ingest));

    let filename = cmd
        .file
        .file_name()
        .map_or_else(|| cmd.file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let handle = dispatcher.submit(&filename, cmd.author.as_deref(), rows)?;
    let upload_id = handle.upload_id();
    if !cmd.json {
        println!("Upload {upload_id}: {row_count} rows from {filename}");
    }

    let report = handle.wait().await?;
    if cmd.json {
        let out = serde_json::json!({
            "upload_id": upload_id,
            "rows": row_count,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!();
    println!("Valid:          {}", report.valid);
    println!("Errors:         {}", report.errors);
    println!("  skipped:      {}", report.skipped);
    println!("  malformed:    {}", report.malformed);
    println!("  duplicates:   {}", report.duplicates);
    println!("  incomplete:   {}", report.incomplete);
    println!("  not stored:   {}", report.persist_failed);
}

fn handle_parse(cmd: &ParseCommand) -> anyhow::Result<()> {
    let parsed = telegram::assemble(&cmd.region, &cmd.shr, cmd.iarr.as_deref())?;

    let warnings: Vec<String> = parsed.warnings.iter().map(ToString::to_string).collect();
    let out = serde_json::json!({
        "valid": parsed.message.is_valid(),
        "missing": parsed.message.missing_required(),
        "warnings": warnings,
        "ignored_markers": parsed.ignored_markers,
        "message": parsed.message,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("fpingest status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Messages:      {}", stats.total_messages);
        println!("Uploads:       {}", stats.total_uploads);
        if let (Some(first), Some(last)) = (&stats.earliest_dof, &stats.latest_dof) {
            println!("Flight dates:  {first} .. {last}");
        }
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_upload(config: &Config, cmd: &UploadCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let upload = storage
        .get_upload(cmd.id)?
        .ok_or(Error::UploadNotFound { id: cmd.id })?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&upload)?);
    } else {
        println!("Upload {}", upload.id);
        println!("  File:     {}", upload.filename);
        if let Some(author) = &upload.author {
            println!("  Author:   {author}");
        }
        println!("  Status:   {}", upload.status);
        println!("  Valid:    {}", upload.valid_count);
        println!("  Errors:   {}", upload.error_count);
        println!("  Created:  {}", upload.created_at.to_rfc3339());
        println!("  Updated:  {}", upload.updated_at.to_rfc3339());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let ingest = &config.ingest;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Ingest]");
                println!("  Region column:  {}", ingest.region_column);
                println!("  SHR column:     {}", ingest.shr_column);
                match ingest.iarr_column {
                    Some(col) => println!("  IARR column:    {col}"),
                    None => println!("  IARR column:    (none)"),
                }
                println!("  Header row:     {}", ingest.has_headers);
                println!("  Delimiter:      {:?}", ingest.delimiter);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
