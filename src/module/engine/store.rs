///! Persistent state store (SQLite)
///!
///! One row per aircraft in the `seen` table. Every mutation is a single
///! atomic row write; the read-modify-write of a `touch` runs inside an
///! immediate transaction so overlapping poll cycles cannot both observe an
///! expired cooldown for the same aircraft.

use super::types::AircraftRecord;
use crate::module::icao::IcaoHex;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ordered schema migrations; `PRAGMA user_version` tracks how many applied.
const MIGRATIONS: &[&str] = &[
    // v1: per-aircraft tracking state
    "CREATE TABLE IF NOT EXISTS seen (
        id                    TEXT PRIMARY KEY,
        last_notify           INTEGER NOT NULL DEFAULT 0,
        session_start         INTEGER NOT NULL,
        day                   TEXT NOT NULL,
        today_visible_seconds INTEGER NOT NULL DEFAULT 0
    );",
];

/// Errors surfaced by the state store and the session engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("state store error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to create state directory {path}: {source}")]
    StateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("state store schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
}

/// Handle to the `seen` table.
pub struct SeenStore {
    conn: Connection,
}

impl SeenStore {
    /// Open (creating parent directories and the schema as needed).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| EngineError::StateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, EngineError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "busy_timeout", 10_000)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let mut store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&mut self) -> Result<(), EngineError> {
        let supported = MIGRATIONS.len() as u32;
        let found = self.schema_version()?;
        if found > supported {
            return Err(EngineError::SchemaTooNew { found, supported });
        }

        for (i, sql) in MIGRATIONS.iter().enumerate().skip(found as usize) {
            let version = (i + 1) as u32;
            let tx = self.conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
            tracing::info!("State store migrated to schema v{}", version);
        }

        Ok(())
    }

    pub fn schema_version(&self) -> Result<u32, EngineError> {
        let version: u32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Begin the read-modify-write transaction for one `touch`.
    ///
    /// Immediate behavior takes the write lock up front, so the record read
    /// inside cannot be invalidated by a concurrent cycle before the write.
    pub(super) fn begin(&mut self) -> Result<Transaction<'_>, rusqlite::Error> {
        self.conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
    }

    pub fn get(&self, id: &IcaoHex) -> Result<Option<AircraftRecord>, EngineError> {
        Ok(Self::get_with(&self.conn, id)?)
    }

    pub(super) fn get_with(
        conn: &Connection,
        id: &IcaoHex,
    ) -> Result<Option<AircraftRecord>, rusqlite::Error> {
        conn.query_row(
            "SELECT id, last_notify, session_start, day, today_visible_seconds
             FROM seen WHERE id = ?1",
            params![id.as_str()],
            |row| {
                let raw: String = row.get(0)?;
                Ok(AircraftRecord {
                    // Stored ids were validated on the way in
                    id: IcaoHex::parse(&raw).map_err(|_| {
                        rusqlite::Error::InvalidColumnType(
                            0,
                            "id".to_string(),
                            rusqlite::types::Type::Text,
                        )
                    })?,
                    last_notify: row.get(1)?,
                    session_start: row.get(2)?,
                    day: row.get(3)?,
                    today_visible_seconds: row.get(4)?,
                })
            },
        )
        .optional()
    }

    /// Write a record as a single atomic upsert. Rollover and close updates
    /// arrive here combined in one record, never as separate writes.
    pub(super) fn upsert_with(
        conn: &Connection,
        record: &AircraftRecord,
    ) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT INTO seen (id, last_notify, session_start, day, today_visible_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                last_notify = ?2,
                session_start = ?3,
                day = ?4,
                today_visible_seconds = ?5",
            params![
                record.id.as_str(),
                record.last_notify,
                record.session_start,
                record.day,
                record.today_visible_seconds,
            ],
        )?;
        Ok(())
    }

    /// Advance `last_notify`, monotonically: an earlier timestamp never
    /// overwrites a later one, and repeated calls are harmless.
    pub fn advance_last_notify(&mut self, id: &IcaoHex, now: i64) -> Result<bool, EngineError> {
        let updated = self.conn.execute(
            "UPDATE seen SET last_notify = ?1 WHERE id = ?2 AND last_notify < ?1",
            params![now, id.as_str()],
        )?;
        Ok(updated > 0)
    }
}
