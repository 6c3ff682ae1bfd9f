//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The pipeline calls store methods and never executes SQL directly.

mod datasets;

pub use datasets::{PersistenceReport, TableLoad, TableLoadStatus};

use crate::{
    error::ValResult,
    executor::{RuleOutcome, ValidationReport},
    types::Timestamp,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct ValidationStore {
    conn: Connection,
}

impl ValidationStore {
    pub fn open(path: &str) -> ValResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ValResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ValResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_datasets.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_validation_runs.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        cutoff: Timestamp,
        version: &str,
        started_at: &str,
    ) -> ValResult<()> {
        self.conn.execute(
            "INSERT INTO validation_run (run_id, cutoff, version, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![run_id, format_timestamp(&cutoff), version, started_at],
        )?;
        Ok(())
    }

    pub fn record_rule_results(&self, run_id: &str, report: &ValidationReport) -> ValResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rule_result (run_id, position, rule, status, exception_count, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, result) in report.results.iter().enumerate() {
                let (status, count, error) = match &result.outcome {
                    RuleOutcome::Completed(set) => ("completed", set.len() as i64, None),
                    RuleOutcome::Failed { cause } => ("failed", 0, Some(cause.as_str())),
                };
                stmt.execute(params![run_id, position as i64, result.rule, status, count, error])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// `(rule, status, exception_count)` rows of one run, in registry order.
    pub fn rule_results(&self, run_id: &str) -> ValResult<Vec<(String, String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT rule, status, exception_count FROM rule_result
             WHERE run_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn run_cutoff(&self, run_id: &str) -> ValResult<Option<String>> {
        let cutoff = self
            .conn
            .query_row(
                "SELECT cutoff FROM validation_run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cutoff)
    }
}

/// Storage text form of a timestamp.
pub(crate) fn format_timestamp(t: &Timestamp) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}
