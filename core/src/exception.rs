//! Exception records produced by validation rules.

use crate::{model::Record, table::Table, value::Value};
use serde::Serialize;

/// One violation: a source row (or a derived aggregate) tagged with the
/// rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionRecord {
    pub rule:   String,
    pub values: Vec<Value>,
}

/// All exceptions one rule produced, with their column headers.
/// An empty set is a positive "no issues found".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionSet {
    pub rule:    String,
    pub columns: Vec<String>,
    pub records: Vec<ExceptionRecord>,
}

impl ExceptionSet {
    pub fn new(rule: &str, columns: Vec<String>) -> Self {
        Self {
            rule: rule.to_string(),
            columns,
            records: Vec::new(),
        }
    }

    /// Set whose columns are the full column list of `rows`' entity.
    pub fn from_records(rule: &str, columns: &[&str], rows: &[&dyn Record]) -> Self {
        let mut set = Self::new(rule, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            set.push(row.values());
        }
        set
    }

    pub fn push(&mut self, values: Vec<Value>) {
        self.records.push(ExceptionRecord {
            rule: self.rule.clone(),
            values,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of `column` across all records, in order.
    pub fn column_values(&self, column: &str) -> Vec<Value> {
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self.records.iter().map(|r| r.values[idx].clone()).collect(),
            None => Vec::new(),
        }
    }

    pub fn to_table(&self) -> Table {
        Table {
            name:    self.rule.clone(),
            columns: self.columns.clone(),
            rows:    self.records.iter().map(|r| r.values.clone()).collect(),
        }
    }
}
