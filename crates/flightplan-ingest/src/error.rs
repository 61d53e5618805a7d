//! Error types for flightplan-ingest.
//!
//! This module defines the crate-level [`Error`] used by storage, configuration
//! and the CLI, plus the two telegram-level error kinds: [`FormatError`], which
//! rejects a whole message, and [`FieldError`], which only blanks one field.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flightplan-ingest operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The requested upload does not exist.
    #[error("upload {id} not found")]
    UploadNotFound {
        /// Upload identifier that was looked up.
        id: i64,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Ingestion Errors ===
    /// The row source could not be read.
    #[error("failed to read rows from {path}: {source}")]
    RowSource {
        /// Path of the sheet export.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// A dispatched batch task panicked or was cancelled.
    #[error("batch task for upload {upload_id} did not complete: {message}")]
    BatchJoin {
        /// Upload the batch belonged to.
        upload_id: i64,
        /// Description of the join failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flightplan-ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means an upload id was unknown.
    #[must_use]
    pub fn is_upload_not_found(&self) -> bool {
        matches!(self, Self::UploadNotFound { .. })
    }
}

/// A telegram that cannot be parsed at all.
///
/// Aborts parsing of that one message; the row is counted as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Fewer than three `-` separated segments.
    #[error("SHR telegram has {found} segment(s), at least 3 required")]
    TooFewSegments {
        /// Number of segments found.
        found: usize,
    },

    /// Segment 0 does not carry the `SHR` marker.
    #[error("SHR telegram is missing the SHR marker in '{segment}'")]
    MissingShrMarker {
        /// The offending first segment.
        segment: String,
    },
}

/// A single field that failed to normalize.
///
/// Never fatal: the field is left empty and parsing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Not exactly four ASCII digits.
    #[error("'{raw}' is not an hhmm time")]
    InvalidTime {
        /// Raw input.
        raw: String,
    },

    /// Hour or minute outside the clock range.
    #[error("time '{raw}' is out of range")]
    TimeOutOfRange {
        /// Raw input.
        raw: String,
    },

    /// Not exactly six ASCII digits.
    #[error("'{raw}' is not a yymmdd date")]
    InvalidDate {
        /// Raw input.
        raw: String,
    },

    /// Six digits that do not name a calendar day.
    #[error("date '{raw}' does not exist")]
    NonexistentDate {
        /// Raw input.
        raw: String,
    },

    /// No `ddmm[ss]N dddmm[ss]E` token found.
    #[error("'{raw}' is not a coordinate")]
    InvalidCoordinate {
        /// Raw input.
        raw: String,
    },

    /// Latitude beyond ±90°.
    #[error("latitude in '{raw}' exceeds 90 degrees")]
    LatitudeOutOfRange {
        /// Raw input.
        raw: String,
    },

    /// Longitude beyond ±180°.
    #[error("longitude in '{raw}' exceeds 180 degrees")]
    LongitudeOutOfRange {
        /// Raw input.
        raw: String,
    },
}
