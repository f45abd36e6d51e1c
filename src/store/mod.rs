//! Durable per-identity ledger of chapter outcomes.
//!
//! One SQLite table keyed by (identity, chapter); a later write for the same
//! key overwrites the earlier one. Rows are created and overwritten here and
//! never deleted, so a crash at any point loses at most the record currently
//! being written.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::chapter::{ChapterId, Outcome};

/// Identity used when no per-user folder can be detected.
pub const DEFAULT_IDENTITY: &str = "default";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS chapter_progress (
        identity    TEXT    NOT NULL,
        chapter_id  INTEGER NOT NULL,
        outcome     TEXT    NOT NULL,
        recorded_at TEXT    NOT NULL,
        PRIMARY KEY (identity, chapter_id)
    );
";

/// Detect the local account identity from the game's per-user data folder.
///
/// Returns the first subdirectory name under `local_data_dir`, or
/// [`DEFAULT_IDENTITY`] when the folder is missing, unreadable, or empty.
pub fn detect_identity(local_data_dir: &Path) -> String {
    let Ok(entries) = std::fs::read_dir(local_data_dir) else {
        return DEFAULT_IDENTITY.to_string();
    };
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            return name.to_string();
        }
    }
    DEFAULT_IDENTITY.to_string()
}

/// SQLite-backed progress ledger, partitioned by identity.
pub struct ProgressStore {
    conn: Option<Connection>,
    identity: String,
}

impl ProgressStore {
    /// Open (or create) the ledger at `path` for `identity`.
    ///
    /// Idempotent across processes sharing the file; the schema is
    /// ensure-exists only. Failure here is fatal to a run.
    pub fn open(path: &Path, identity: impl Into<String>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        let conn = Connection::open(path).context("failed to open progress database")?;
        Self::init(conn, identity.into())
    }

    /// In-memory ledger for tests.
    pub fn open_in_memory(identity: impl Into<String>) -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("failed to open in-memory progress database")?;
        Self::init(conn, identity.into())
    }

    fn init(conn: Connection, identity: String) -> Result<Self> {
        // Each mark() is a single autocommit statement; FULL makes it durable
        // before the call returns.
        conn.execute_batch("PRAGMA synchronous = FULL;")
            .context("failed to set synchronous pragma")?;
        conn.execute_batch(SCHEMA)
            .context("failed to create progress table")?;
        Ok(Self {
            conn: Some(conn),
            identity,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .context("progress store has been closed")
    }

    /// All chapters already resolved (won or skipped) for this identity.
    pub fn completed(&self) -> Result<HashSet<ChapterId>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT chapter_id FROM chapter_progress \
                 WHERE identity = ?1 AND outcome IN ('won', 'skipped')",
            )
            .context("failed to prepare completed query")?;
        let rows = stmt
            .query_map(params![self.identity], |row| row.get::<_, i64>(0))
            .context("failed to query completed chapters")?;
        let mut out = HashSet::new();
        for id in rows {
            out.insert(ChapterId::new(id? as u32));
        }
        Ok(out)
    }

    /// Record `outcome` for `chapter`, overwriting any earlier record.
    ///
    /// Durable before returning; a crash immediately after cannot lose it.
    pub fn mark(&self, chapter: ChapterId, outcome: Outcome) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chapter_progress (identity, chapter_id, outcome, recorded_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (identity, chapter_id) DO UPDATE \
             SET outcome = excluded.outcome, recorded_at = excluded.recorded_at",
            params![
                self.identity,
                i64::from(chapter.get()),
                outcome.as_str(),
                Utc::now().to_rfc3339()
            ],
        )
        .context("failed to record chapter outcome")?;
        debug!(%chapter, %outcome, "recorded chapter outcome");
        Ok(())
    }

    /// Aggregate counts per outcome for this identity. Reporting only.
    pub fn stats(&self) -> Result<HashMap<Outcome, u64>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT outcome, COUNT(*) FROM chapter_progress \
                 WHERE identity = ?1 GROUP BY outcome",
            )
            .context("failed to prepare stats query")?;
        let rows = stmt
            .query_map(params![self.identity], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .context("failed to query stats")?;
        let mut out = HashMap::new();
        for row in rows {
            let (raw, count) = row?;
            match Outcome::from_str(&raw) {
                Ok(outcome) => {
                    out.insert(outcome, count as u64);
                }
                Err(err) => debug!(error = %err, "ignoring unknown outcome row"),
            }
        }
        Ok(out)
    }

    /// Release the underlying handle. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.close();
        }
    }
}

impl Drop for ProgressStore {
    fn drop(&mut self) {
        self.close();
    }
}
