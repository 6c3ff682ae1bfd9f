//! Named tabular output: one report sheet.

use crate::{types::SheetName, value::Value};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name:    SheetName,
    pub columns: Vec<String>,
    pub rows:    Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<SheetName>, columns: &[&str]) -> Self {
        Self {
            name:    name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows:    Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch in {}", self.name);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
