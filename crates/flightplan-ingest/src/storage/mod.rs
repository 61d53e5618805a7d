//! Storage layer for flightplan-ingest.
//!
//! This module provides `SQLite`-based persistence for parsed messages and
//! the upload ledger. Messages are unique by [`ParsedMessage::storage_hash`],
//! so re-ingesting a sheet never duplicates rows.

pub mod migrations;
pub mod schema;
mod uploads;

pub use uploads::{Upload, UploadStatus};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::message::{LonLat, ParsedMessage};

const MESSAGE_COLUMNS: &str = r"
    id, upload_id, created_at, region, sid, dof, atd, ata,
    dep_coords, dep_lon, dep_lat, arr_coords, arr_lon, arr_lat,
    opr, reg, typ, rmk, min_alt, max_alt
";

/// Storage engine for parsed messages.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist one message and its zone points in a single transaction.
    ///
    /// Returns the assigned ID, or `None` if a message with the same
    /// storage hash already exists. Zone points outside the WGS84 ranges are
    /// not stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is written
    /// in that case.
    pub fn insert_message(
        &mut self,
        message: &ParsedMessage,
        upload_id: Option<i64>,
    ) -> Result<Option<i64>> {
        let hash = message.storage_hash();
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            r"
            INSERT OR IGNORE INTO messages (
                message_hash, upload_id, region, sid, dof, atd, ata,
                dep_coords, dep_lon, dep_lat, arr_coords, arr_lon, arr_lat,
                opr, reg, typ, rmk, min_alt, max_alt, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            )
            ",
            params![
                hash,
                upload_id,
                message.region,
                message.sid,
                message.dof,
                message.atd,
                message.ata,
                message.dep_coords,
                message.dep_latlon.lon,
                message.dep_latlon.lat,
                message.arr_coords,
                message.arr_latlon.map(|p| p.lon),
                message.arr_latlon.map(|p| p.lat),
                message.opr,
                message.reg,
                message.typ,
                message.rmk,
                message.min_alt,
                message.max_alt,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            debug!(sid = %message.sid, hash = &hash[..16], "message already stored");
            return Ok(None);
        }
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO zone_points (message_id, seq, coords, lon, lat) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let points = message.zone_coords.iter().zip(&message.zone_latlon);
            for (seq, (coords, position)) in points.enumerate() {
                if !position.in_range() {
                    warn!(sid = %message.sid, %coords, "skipping out-of-range zone point");
                    continue;
                }
                let seq = i64::try_from(seq).unwrap_or(i64::MAX);
                stmt.execute(params![id, seq, coords, position.lon, position.lat])?;
            }
        }

        tx.commit()?;
        debug!(id, sid = %message.sid, "inserted message");
        Ok(Some(id))
    }

    /// Get a message by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_message(&self, id: i64) -> Result<Option<StoredMessage>> {
        let stored = self
            .conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                [id],
                Self::row_to_message,
            )
            .optional()?;

        stored.map(|m| self.with_zone(m)).transpose()
    }

    /// All stored messages with the given flight identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_sid(&self, sid: &str) -> Result<Vec<StoredMessage>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE sid = ?1 ORDER BY dof, atd"
        ))?;

        let messages = stmt
            .query_map([sid], Self::row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        messages.into_iter().map(|m| self.with_zone(m)).collect()
    }

    /// The most recent messages by date of flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY dof DESC, atd DESC, id DESC LIMIT ?1"
        ))?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let messages = stmt
            .query_map([limit_i64], Self::row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        messages.into_iter().map(|m| self.with_zone(m)).collect()
    }

    /// Count stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_messages(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_messages = self.count_messages()?;
        let total_uploads: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM uploads", [], |row| row.get(0))?;

        let (earliest_dof, latest_dof): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(NULLIF(dof, '')), MAX(NULLIF(dof, '')) FROM messages",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_messages,
            total_uploads,
            earliest_dof,
            latest_dof,
            db_size_bytes,
        })
    }

    fn with_zone(&self, mut stored: StoredMessage) -> Result<StoredMessage> {
        let mut stmt = self.conn.prepare(
            "SELECT coords, lon, lat FROM zone_points WHERE message_id = ?1 ORDER BY seq",
        )?;
        let points = stmt
            .query_map([stored.id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    LonLat::new(row.get(1)?, row.get(2)?),
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        (stored.message.zone_coords, stored.message.zone_latlon) = points.into_iter().unzip();
        Ok(stored)
    }

    /// Convert a database row to a [`StoredMessage`] without zone points.
    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<StoredMessage> {
        let created_at: String = row.get(2)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        let arr_lon: Option<f64> = row.get(12)?;
        let arr_lat: Option<f64> = row.get(13)?;

        let message = ParsedMessage {
            region: row.get(3)?,
            sid: row.get(4)?,
            dof: row.get(5)?,
            atd: row.get(6)?,
            ata: row.get(7)?,
            dep_coords: row.get(8)?,
            dep_latlon: LonLat::new(row.get(9)?, row.get(10)?),
            arr_coords: row.get(11)?,
            arr_latlon: arr_lon.zip(arr_lat).map(|(lon, lat)| LonLat::new(lon, lat)),
            zone_coords: Vec::new(),
            zone_latlon: Vec::new(),
            opr: row.get(14)?,
            reg: row.get(15)?,
            typ: row.get(16)?,
            rmk: row.get(17)?,
            min_alt: row.get(18)?,
            max_alt: row.get(19)?,
        };

        Ok(StoredMessage {
            id: row.get(0)?,
            upload_id: row.get(1)?,
            created_at,
            message,
        })
    }
}

/// A message read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMessage {
    /// Row ID.
    pub id: i64,
    /// Upload the message arrived with, if any.
    pub upload_id: Option<i64>,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
    /// The message itself.
    #[serde(flatten)]
    pub message: ParsedMessage,
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of messages stored.
    pub total_messages: i64,
    /// Total number of uploads recorded.
    pub total_uploads: i64,
    /// Earliest date of flight.
    pub earliest_dof: Option<String>,
    /// Latest date of flight.
    pub latest_dof: Option<String>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// A [`Storage`] shared between concurrently running batches.
#[derive(Debug, Clone)]
pub struct SharedStorage(Arc<Mutex<Storage>>);

impl SharedStorage {
    /// Wrap a storage handle.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self(Arc::new(Mutex::new(storage)))
    }

    /// Lock the underlying storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder panicked.
    pub fn lock(&self) -> Result<MutexGuard<'_, Storage>> {
        self.0
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))
    }
}
