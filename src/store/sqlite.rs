use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::detect::ComparisonKey;
use crate::error::StoreCorruptionError;
use crate::snapshot::Snapshot;
use super::{HistoryRecord, HistoryStore, NewRecord};

/// Database file name inside the history directory.
pub const DB_FILE_NAME: &str = "history.db";

const SELECT_COLUMNS: &str = "SELECT id, ts, hash, image, snapshot FROM records";

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY,
            ts TEXT NOT NULL UNIQUE,
            fetched_at TEXT,
            hash TEXT NOT NULL,
            snapshot TEXT NOT NULL,
            image TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Raw row before the snapshot column is decoded.
struct Row {
    id: i64,
    ts: String,
    hash: String,
    image: String,
    snapshot: String,
}

impl Row {
    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Row {
            id: row.get(0)?,
            ts: row.get(1)?,
            hash: row.get(2)?,
            image: row.get(3)?,
            snapshot: row.get(4)?,
        })
    }

    fn decode(self) -> Result<HistoryRecord, StoreCorruptionError> {
        let raw_snapshot: Snapshot = serde_json::from_str(&self.snapshot)
            .map_err(|source| StoreCorruptionError::Decode { id: self.id, source })?;

        Ok(HistoryRecord {
            id: self.id,
            timestamp: self.ts,
            comparison_key: ComparisonKey::from_stored(self.hash),
            image_reference: self.image,
            raw_snapshot,
        })
    }
}

/// History store backed by a single SQLite file. Open once per run.
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreCorruptionError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreCorruptionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        init_schema(&conn)?;
        debug!(path = %db_path.display(), "opened history store");
        Ok(SqliteHistoryStore { conn })
    }

    /// Non-durable store, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StoreCorruptionError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteHistoryStore { conn })
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<HistoryRecord>, StoreCorruptionError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Row::read)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Row::decode).collect()
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&mut self, record: NewRecord) -> Result<i64, StoreCorruptionError> {
        let snapshot_json = serde_json::to_string(&record.raw_snapshot)
            .map_err(StoreCorruptionError::Encode)?;
        let fetched_at = record.raw_snapshot.fetched_at.map(|t| t.to_rfc3339());

        let tx = self.conn.transaction()?;

        // explicit ids keep the sequence gap-free, unlike AUTOINCREMENT
        let id: i64 =
            tx.query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM records", [], |row| row.get(0))?;

        tx.execute(
            "INSERT INTO records (id, ts, fetched_at, hash, snapshot, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                record.timestamp,
                fetched_at,
                record.comparison_key.as_str(),
                snapshot_json,
                record.image_reference,
            ],
        )?;

        tx.commit()?;

        debug!(id, ts = %record.timestamp, "appended history record");
        Ok(id)
    }

    fn latest(&self) -> Result<Option<HistoryRecord>, StoreCorruptionError> {
        let row = self
            .conn
            .query_row(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT 1"), [], Row::read)
            .optional()?;

        row.map(Row::decode).transpose()
    }

    fn list(
        &self,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, StoreCorruptionError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        match before {
            Some(ts) => self.query(
                &format!("{SELECT_COLUMNS} WHERE ts < ?1 ORDER BY id DESC LIMIT ?2"),
                params![ts, limit],
            ),
            None => self.query(
                &format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1"),
                params![limit],
            ),
        }
    }

    fn range(&self, from: &str, to: &str) -> Result<Vec<HistoryRecord>, StoreCorruptionError> {
        self.query(
            &format!("{SELECT_COLUMNS} WHERE ts >= ?1 AND ts <= ?2 ORDER BY id DESC"),
            params![from, to],
        )
    }

    fn get(&self, id: i64) -> Result<Option<HistoryRecord>, StoreCorruptionError> {
        let row = self
            .conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), params![id], Row::read)
            .optional()?;

        row.map(Row::decode).transpose()
    }

    fn count(&self) -> Result<usize, StoreCorruptionError> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}
