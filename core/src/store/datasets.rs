use super::{format_timestamp, ValidationStore};
use crate::{
    error::ValResult,
    model::{Datasets, Entity},
};
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableLoadStatus {
    Loaded { rows: usize },
    Failed { cause: String },
    /// Written, then undone because a later table failed.
    RolledBack,
    /// Not attempted because an earlier table failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub table:  &'static str,
    pub status: TableLoadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistenceReport {
    pub tables:    Vec<TableLoad>,
    pub committed: bool,
}

impl PersistenceReport {
    pub fn status(&self, entity: Entity) -> Option<&TableLoadStatus> {
        self.tables
            .iter()
            .find(|t| t.table == entity.name())
            .map(|t| &t.status)
    }
}

impl ValidationStore {
    // ── Dataset tables ────────────────────────────────────────────

    /// Replace the contents of all three tables in one transaction.
    /// Either every table holds the new rows afterwards or none changed.
    pub fn replace_datasets(&self, data: &Datasets) -> ValResult<PersistenceReport> {
        let tx = self.conn.unchecked_transaction()?;
        let mut report = PersistenceReport::default();
        let mut failed = false;

        for entity in Entity::ALL {
            let status = if failed {
                TableLoadStatus::Skipped
            } else {
                match replace_table(&tx, data, entity) {
                    Ok(rows) => {
                        log::info!("{entity}: {rows} row(s) staged");
                        TableLoadStatus::Loaded { rows }
                    }
                    Err(e) => {
                        log::warn!("{entity}: load failed: {e}");
                        failed = true;
                        TableLoadStatus::Failed { cause: e.to_string() }
                    }
                }
            };
            report.tables.push(TableLoad { table: entity.name(), status });
        }

        if failed {
            tx.rollback()?;
            for t in &mut report.tables {
                if matches!(t.status, TableLoadStatus::Loaded { .. }) {
                    t.status = TableLoadStatus::RolledBack;
                }
            }
            log::warn!("Persistence rolled back; no table was changed");
        } else {
            tx.commit()?;
            report.committed = true;
        }
        Ok(report)
    }

    pub fn row_count(&self, entity: Entity) -> ValResult<i64> {
        let n = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", entity.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn replace_table(conn: &Connection, data: &Datasets, entity: Entity) -> rusqlite::Result<usize> {
    conn.execute(&format!("DELETE FROM {}", entity.name()), [])?;
    let ts = |t: &Option<crate::types::Timestamp>| t.as_ref().map(format_timestamp);

    match entity {
        Entity::Customers => {
            let mut stmt = conn.prepare(
                "INSERT INTO customers (customer_id, segment, country, is_enterprise, signup_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &data.customers {
                stmt.execute(params![
                    c.customer_id,
                    c.segment,
                    c.country,
                    c.is_enterprise,
                    ts(&c.signup_date),
                ])?;
            }
        }
        Entity::Subscriptions => {
            let mut stmt = conn.prepare(
                "INSERT INTO subscriptions
                     (customer_id, status, monthly_price, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for s in &data.subscriptions {
                stmt.execute(params![
                    s.customer_id,
                    s.status,
                    s.monthly_price,
                    ts(&s.start_date),
                    ts(&s.end_date),
                ])?;
            }
        }
        Entity::Events => {
            let mut stmt = conn.prepare(
                "INSERT INTO events (customer_id, event_type, event_date, source)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for e in &data.events {
                stmt.execute(params![e.customer_id, e.event_type, ts(&e.event_date), e.source])?;
            }
        }
    }
    Ok(data.row_count(entity))
}
