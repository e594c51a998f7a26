//! Persistent id -> timestamp index over a single-file SQLite store.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::record::{format_timestamp, MalformedRecord, Submission};
use crate::sink::RecordSink;

/// `ts (id TEXT PRIMARY KEY, ts TEXT)` with upsert semantics: re-inserting
/// an id overwrites, so a restarted build is idempotent. Writes accumulate
/// in one open transaction; `commit()` is called at file boundaries to
/// bound uncommitted state on a store with tens of millions of keys.
pub struct TimestampDb {
    conn: Connection,
    in_tx: bool,
}

impl TimestampDb {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open timestamp db {}", path.display()))?;
        conn.execute_batch("CREATE TABLE IF NOT EXISTS ts (id TEXT PRIMARY KEY, ts TEXT)")?;
        Ok(Self { conn, in_tx: false })
    }

    pub fn upsert(&mut self, id: &str, ts: &str) -> Result<()> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN")?;
            self.in_tx = true;
        }
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR REPLACE INTO ts (id, ts) VALUES (?1, ?2)")?;
        stmt.execute((id, ts))?;
        Ok(())
    }

    /// Commit buffered upserts; the next `upsert` opens a fresh transaction.
    pub fn commit(&mut self) -> Result<()> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT")?;
            self.in_tx = false;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT ts FROM ts WHERE id = ?1")?;
        Ok(stmt.query_row([id], |row| row.get(0)).optional()?)
    }

    /// Drop the scratch table at the end of a cleanup workflow.
    pub fn drop_table(&mut self) -> Result<()> {
        self.commit()?;
        self.conn.execute_batch("DROP TABLE IF EXISTS ts")?;
        Ok(())
    }
}

/// Sink (a): id -> formatted UTC timestamp, committed once per input file.
pub struct TimestampIndexSink {
    db: TimestampDb,
}

impl TimestampIndexSink {
    pub fn new(db: TimestampDb) -> Self {
        Self { db }
    }

    /// Hand the store back, e.g. for the hyperlink cleanup pass.
    pub fn into_db(mut self) -> Result<TimestampDb> {
        self.db.commit()?;
        Ok(self.db)
    }
}

impl RecordSink for TimestampIndexSink {
    fn record(&mut self, line: &str) -> Result<Option<String>> {
        let sub = Submission::parse(line)?;
        let id = sub.id.ok_or_else(|| MalformedRecord::new("missing id"))?;
        let epoch = sub
            .created_utc
            .ok_or_else(|| MalformedRecord::new("missing created_utc"))?;
        let ts = format_timestamp(epoch)?;
        self.db.upsert(&id, &ts)?;
        Ok(Some(ts))
    }

    fn file_boundary(&mut self) -> Result<()> {
        self.db.commit()
    }

    fn finish(&mut self) -> Result<()> {
        self.db.commit()
    }
}
