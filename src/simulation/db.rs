//! SQLite database for simulation results
//!
//! Provides persistent storage and querying of headless runs.
//! Uses WAL mode for concurrent reads during writes.

use rusqlite::{Connection, Result, params};
use std::path::Path;

use super::metrics::RunResult;

/// Database wrapper for simulation results
pub struct SimDatabase {
    conn: Connection,
}

impl SimDatabase {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                session_type TEXT NOT NULL,
                config_json TEXT
            );

            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                session_id TEXT REFERENCES sessions(id),
                run_uuid TEXT NOT NULL,
                started_at TEXT NOT NULL,
                seed INTEGER NOT NULL,
                script TEXT NOT NULL,
                body_count INTEGER NOT NULL,
                frames INTEGER NOT NULL,
                sim_time REAL NOT NULL,
                injections INTEGER NOT NULL,
                floor_impacts INTEGER NOT NULL,
                contacts INTEGER NOT NULL,
                peak_penetration REAL NOT NULL,
                bound_violations INTEGER NOT NULL,
                final_kinetic_energy REAL NOT NULL,
                wall_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_runs_session ON runs(session_id);
            CREATE INDEX IF NOT EXISTS idx_runs_seed ON runs(seed);

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                run_id INTEGER REFERENCES runs(id),
                time_ms INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_events_run ON events(run_id);
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
            "#,
        )?;
        Ok(())
    }

    /// Create a new session and return its ID
    pub fn create_session(&self, session_type: &str, config_json: Option<&str>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO sessions (id, created_at, session_type, config_json) VALUES (?1, ?2, ?3, ?4)",
            params![id, created_at, session_type, config_json],
        )?;

        Ok(id)
    }

    /// Insert a run result and return its row ID
    pub fn insert_run(&self, session_id: &str, result: &RunResult) -> Result<i64> {
        let m = &result.metrics;
        self.conn.execute(
            r#"INSERT INTO runs
               (session_id, run_uuid, started_at, seed, script, body_count, frames, sim_time,
                injections, floor_impacts, contacts, peak_penetration, bound_violations,
                final_kinetic_energy, wall_ms)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
            params![
                session_id,
                result.run_id,
                result.started_at,
                result.seed as i64,
                result.script,
                result.body_count as i64,
                m.frames as i64,
                m.sim_time,
                m.injections,
                m.floor_impacts,
                m.contacts,
                m.peak_penetration,
                m.bound_violations,
                m.final_kinetic_energy,
                result.wall_ms as i64,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a batch of serialized events for a run
    pub fn insert_events(&self, run_id: i64, events: &[(u32, &str, String)]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO events (run_id, time_ms, event_type, data) VALUES (?1, ?2, ?3, ?4)",
        )?;

        for (time_ms, event_type, data) in events {
            stmt.execute(params![run_id, time_ms, event_type, data])?;
        }

        Ok(())
    }

    pub fn run_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))
    }

    pub fn session_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
    }

    /// Runs of a session, oldest first
    pub fn query_runs(&self, session_id: &str) -> Result<Vec<RunSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seed, frames, injections, contacts, bound_violations, final_kinetic_energy
             FROM runs WHERE session_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            Ok(RunSummary {
                id: row.get(0)?,
                seed: row.get::<_, i64>(1)? as u64,
                frames: row.get::<_, i64>(2)? as u64,
                injections: row.get(3)?,
                contacts: row.get(4)?,
                bound_violations: row.get(5)?,
                final_kinetic_energy: row.get(6)?,
            })
        })?;

        rows.collect()
    }

    /// Events of a run, in time order
    pub fn get_events(&self, run_id: i64) -> Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, time_ms, event_type, data FROM events WHERE run_id = ?1 ORDER BY time_ms, id",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok(EventRecord {
                id: row.get(0)?,
                time_ms: row.get(1)?,
                event_type: row.get(2)?,
                data: row.get(3)?,
            })
        })?;

        rows.collect()
    }
}

/// A record from the events table
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: i64,
    pub time_ms: u32,
    pub event_type: String,
    pub data: String,
}

/// Summary of a stored run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub id: i64,
    pub seed: u64,
    pub frames: u64,
    pub injections: u32,
    pub contacts: u32,
    pub bound_violations: u32,
    pub final_kinetic_energy: f32,
}
