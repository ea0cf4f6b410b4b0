pub mod tasks;
pub mod users;

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    profile_picture TEXT,
    notifications_enabled INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    location TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    repeat_frequency TEXT NOT NULL DEFAULT 'none',
    repeat_days TEXT,
    start_date TEXT,
    end_date TEXT,
    reminder_minutes INTEGER,
    notification_id TEXT,
    reminder_state TEXT NOT NULL DEFAULT 'none'
);
CREATE INDEX IF NOT EXISTS idx_tasks_user_date ON tasks (user_id, date);
";

/// Embedded row store over sqlite. All reads are point-in-time snapshots;
/// callers re-query after every mutation to refresh their view.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Dates are stored as ISO "YYYY-MM-DD" text, which sorts and compares
/// chronologically in SQL.
pub(crate) const DATE_FMT: &str = "%Y-%m-%d";

pub(crate) fn conversion_err(
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}
