//! `flightplan-ingest` - SHR/IARR flight-plan telegram ingestion
//!
//! This library turns spreadsheet rows of free-form aviation telegrams into
//! normalized flight events and hands the valid ones to a persistence sink.
//!
//! - [`telegram`] parses one SHR telegram plus its IARR companion.
//! - [`ingest`] walks a batch of rows with in-batch deduplication and
//!   required-field gating.
//! - [`storage`] is the `SQLite` sink and upload ledger.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod message;
pub mod source;
pub mod storage;
pub mod telegram;

pub use config::Config;
pub use error::{Error, FieldError, FormatError, Result};
pub use ingest::{IngestReport, Ingestor, MessageSink, PersistError, RowOutcome};
pub use logging::init_logging;
pub use message::{LonLat, ParsedMessage};
pub use storage::{SharedStorage, Storage, StorageStats};
