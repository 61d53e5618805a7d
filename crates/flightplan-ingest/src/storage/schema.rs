//! `SQLite` schema definitions for flightplan-ingest.

/// One row per persisted flight event.
pub const CREATE_MESSAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_hash TEXT NOT NULL UNIQUE,
    upload_id INTEGER REFERENCES uploads(id),
    region TEXT NOT NULL,
    sid TEXT NOT NULL,
    dof TEXT NOT NULL,
    atd TEXT NOT NULL,
    ata TEXT NOT NULL,
    dep_coords TEXT NOT NULL,
    dep_lon REAL NOT NULL,
    dep_lat REAL NOT NULL,
    arr_coords TEXT,
    arr_lon REAL,
    arr_lat REAL,
    opr TEXT,
    reg TEXT,
    typ TEXT,
    rmk TEXT,
    min_alt INTEGER NOT NULL DEFAULT 0,
    max_alt INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
";

/// Flight-zone boundary points, ordered by `seq` within a message.
pub const CREATE_ZONE_POINTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS zone_points (
    message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    coords TEXT NOT NULL,
    lon REAL NOT NULL,
    lat REAL NOT NULL,
    PRIMARY KEY (message_id, seq)
)
";

/// Upload ledger.
pub const CREATE_UPLOADS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    author TEXT,
    status TEXT NOT NULL,
    valid_count INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Lookup by flight identifier.
pub const CREATE_SID_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_messages_sid ON messages(sid)
";

/// Recent-first listing.
pub const CREATE_DOF_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_messages_dof ON messages(dof DESC, atd DESC)
";

/// Messages of one upload. Created by the version 2 migration.
pub const CREATE_UPLOAD_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_messages_upload ON messages(upload_id)
";

/// Key-value store, holds the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_UPLOADS_TABLE,
    CREATE_MESSAGES_TABLE,
    CREATE_ZONE_POINTS_TABLE,
    CREATE_SID_INDEX,
    CREATE_DOF_INDEX,
    CREATE_METADATA_TABLE,
];
