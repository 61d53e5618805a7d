//! Upload ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::Storage;

/// Lifecycle of an uploaded sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Rows are still being ingested.
    Processing,
    /// Ingestion finished; counts are final.
    Parsed,
    /// The batch did not complete.
    Failed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Parsed => write!(f, "parsed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "parsed" => Ok(Self::Parsed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown upload status '{other}'")),
        }
    }
}

impl FromSql for UploadStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// One uploaded sheet and its ingestion counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
    /// Upload ID.
    pub id: i64,
    /// Original file name.
    pub filename: String,
    /// Who submitted it.
    pub author: Option<String>,
    /// Current status.
    pub status: UploadStatus,
    /// Rows persisted.
    pub valid_count: u32,
    /// Rows rejected.
    pub error_count: u32,
    /// When the upload was recorded.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

impl Storage {
    /// Record a new upload in `processing` state and return its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_upload(&self, filename: &str, author: Option<&str>) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r"
            INSERT INTO uploads (filename, author, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
            params![filename, author, UploadStatus::Processing.to_string(), now],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, filename, "upload recorded");
        Ok(id)
    }

    /// Mark an upload `parsed` with its final counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadNotFound`] for an unknown ID, or an error if the
    /// database operation fails.
    pub fn finish_upload(&self, id: i64, valid_count: u32, error_count: u32) -> Result<()> {
        self.set_upload_status(id, UploadStatus::Parsed, Some((valid_count, error_count)))
    }

    /// Mark an upload `failed`, keeping whatever counts it had.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadNotFound`] for an unknown ID, or an error if the
    /// database operation fails.
    pub fn fail_upload(&self, id: i64) -> Result<()> {
        self.set_upload_status(id, UploadStatus::Failed, None)
    }

    fn set_upload_status(
        &self,
        id: i64,
        status: UploadStatus,
        counts: Option<(u32, u32)>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let affected = match counts {
            Some((valid, errors)) => self.conn.execute(
                r"
                UPDATE uploads SET status = ?2, valid_count = ?3, error_count = ?4, updated_at = ?5
                WHERE id = ?1
                ",
                params![id, status.to_string(), valid, errors, now],
            )?,
            None => self.conn.execute(
                "UPDATE uploads SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, status.to_string(), now],
            )?,
        };

        if affected == 0 {
            return Err(Error::UploadNotFound { id });
        }
        debug!(id, %status, "upload status changed");
        Ok(())
    }

    /// Get an upload by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_upload(&self, id: i64) -> Result<Option<Upload>> {
        let upload = self
            .conn
            .query_row(
                r"
                SELECT id, filename, author, status, valid_count, error_count, created_at, updated_at
                FROM uploads WHERE id = ?1
                ",
                [id],
                |row| {
                    Ok(Upload {
                        id: row.get(0)?,
                        filename: row.get(1)?,
                        author: row.get(2)?,
                        status: row.get(3)?,
                        valid_count: row.get(4)?,
                        error_count: row.get(5)?,
                        created_at: parse_timestamp(&row.get::<_, String>(6)?),
                        updated_at: parse_timestamp(&row.get::<_, String>(7)?),
                    })
                },
            )
            .optional()?;
        Ok(upload)
    }
}
