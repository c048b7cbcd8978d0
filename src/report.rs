//! SQLite run report.
//!
//! One `runs` row per invocation and one `track_outcomes` row per processed
//! track. The report is output only: runs never read it back, resuming relies on
//! the destination favorites alone.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::Resolution;
use crate::models::{RunSummary, SourceTrack};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        started_at INTEGER NOT NULL,
        finished_at INTEGER,
        track_limit INTEGER NOT NULL,
        success_count INTEGER,
        failure_count INTEGER
    );

    CREATE TABLE IF NOT EXISTS track_outcomes (
        run_id INTEGER NOT NULL REFERENCES runs(id),
        position INTEGER NOT NULL,
        title TEXT NOT NULL,
        artists TEXT NOT NULL,
        status TEXT NOT NULL,
        candidate_id TEXT,
        candidate_name TEXT,
        score REAL,
        query TEXT,
        error TEXT,
        PRIMARY KEY (run_id, position)
    );";

/// Status stored for a track whose resolution failed.
pub const STATUS_ERROR: &str = "error";

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct RunReport {
    conn: Connection,
    run_id: i64,
}

impl RunReport {
    /// Open (or create) the report database and start a new run.
    pub fn create(path: &Path, track_limit: usize) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open report database: {:?}", path))?;
        Self::start(conn, track_limit)
    }

    pub fn in_memory(track_limit: usize) -> Result<Self> {
        Self::start(Connection::open_in_memory()?, track_limit)
    }

    fn start(conn: Connection, track_limit: usize) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create report tables")?;
        conn.execute(
            "INSERT INTO runs (started_at, track_limit) VALUES (?1, ?2)",
            params![unix_now(), track_limit as i64],
        )?;
        let run_id = conn.last_insert_rowid();
        Ok(Self { conn, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn record_resolution(
        &self,
        position: usize,
        track: &SourceTrack,
        resolution: &Resolution,
    ) -> Result<()> {
        let matched = resolution.matched.as_ref();
        self.conn.execute(
            "INSERT INTO track_outcomes
                (run_id, position, title, artists, status, candidate_id, candidate_name, score, query, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)",
            params![
                self.run_id,
                position as i64,
                track.title(),
                track.artists().join(", "),
                resolution.outcome.as_str(),
                matched.map(|m| m.candidate.id.as_str()),
                matched.map(|m| m.candidate.display_name.as_str()),
                matched.map(|m| m.score),
                resolution.query.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn record_error(&self, position: usize, track: &SourceTrack, error: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO track_outcomes (run_id, position, title, artists, status, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.run_id,
                position as i64,
                track.title(),
                track.artists().join(", "),
                STATUS_ERROR,
                error,
            ],
        )?;
        Ok(())
    }

    pub fn finish(&self, summary: &RunSummary) -> Result<()> {
        self.conn.execute(
            "UPDATE runs SET finished_at = ?1, success_count = ?2, failure_count = ?3 WHERE id = ?4",
            params![
                unix_now(),
                summary.success_count as i64,
                summary.failure_count as i64,
                self.run_id,
            ],
        )?;
        Ok(())
    }
}

/// Per-status counts for one run, sorted by status.
pub fn status_counts(conn: &Connection, run_id: i64) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM track_outcomes WHERE run_id = ?1 GROUP BY status ORDER BY status",
    )?;
    let rows = stmt
        .query_map([run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Most recent run id, if any run was recorded.
pub fn latest_run_id(conn: &Connection) -> Result<Option<i64>> {
    let id: Option<i64> = conn.query_row("SELECT MAX(id) FROM runs", [], |row| row.get(0))?;
    Ok(id)
}
