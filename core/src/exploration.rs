//! Descriptive exploration of the loaded datasets.
//!
//! Reporting convenience only: nothing here blocks or alters persistence.

use crate::{
    model::{Datasets, Entity, Record},
    table::Table,
    value::{Value, ValueKey},
};
use std::{cmp::Ordering, collections::HashMap};

/// Categorical columns profiled per entity, with their sheet names.
const VALUE_COUNT_SHEETS: [(Entity, &str, &str); 7] = [
    (Entity::Customers, "segment", "customers_unique_segments"),
    (Entity::Customers, "country", "customers_unique_countries"),
    (Entity::Customers, "is_enterprise", "customers_is_enterprise"),
    (Entity::Subscriptions, "status", "subscriptions_unique_status"),
    (Entity::Subscriptions, "monthly_price", "subscriptions_price_dist"),
    (Entity::Events, "event_type", "events_type_counts"),
    (Entity::Events, "source", "events_source_counts"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorationSummary {
    /// `<entity>_desc` followed by that entity's value-count sheets.
    pub exploration: Vec<Table>,
    /// `<entity>_missing`
    pub missing: Vec<Table>,
    /// `<entity>_duplicates`
    pub duplicates: Vec<Table>,
}

impl ExplorationSummary {
    pub fn build(data: &Datasets) -> Self {
        let mut summary = Self::default();
        for entity in Entity::ALL {
            let rows = data.rows(entity);
            summary.exploration.push(describe(entity, &rows));
            for (e, column, sheet) in VALUE_COUNT_SHEETS {
                if e == entity {
                    summary.exploration.push(value_counts(sheet, &rows, column));
                }
            }
            summary.missing.push(missing_counts(entity, &rows));
            summary.duplicates.push(duplicate_rows(entity, &rows));
        }
        log::info!(
            "Exploration: {} summary sheets, {} duplicate row(s)",
            summary.exploration.len(),
            summary.duplicates.iter().map(Table::len).sum::<usize>()
        );
        summary
    }

    /// All sheets in report order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.exploration
            .iter()
            .chain(self.missing.iter())
            .chain(self.duplicates.iter())
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables().find(|t| t.name == name)
    }
}

fn column_values(rows: &[&dyn Record], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|r| r.value(column).unwrap_or(Value::Null))
        .collect()
}

/// Values with their frequency, most frequent first, ties in
/// first-appearance order.
fn frequencies(values: &[Value], include_null: bool) -> Vec<(Value, usize)> {
    let mut index: HashMap<ValueKey, usize> = HashMap::new();
    let mut freq: Vec<(Value, usize)> = Vec::new();
    for v in values {
        if v.is_null() && !include_null {
            continue;
        }
        match index.get(&v.key()) {
            Some(&i) => freq[i].1 += 1,
            None => {
                index.insert(v.key(), freq.len());
                freq.push((v.clone(), 1));
            }
        }
    }
    // Stable sort keeps first appearance among equal counts.
    freq.sort_by(|a, b| b.1.cmp(&a.1));
    freq
}

/// Per-column count/unique/top/freq, plus min/max for ordered columns and
/// mean for numeric ones.
fn describe(entity: Entity, rows: &[&dyn Record]) -> Table {
    let mut table = Table::new(
        format!("{entity}_desc"),
        &["column", "count", "unique", "top", "freq", "min", "max", "mean"],
    );
    for column in entity.columns() {
        let values = column_values(rows, column);
        let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
        let freq = frequencies(&values, false);
        let (top, top_n) = freq
            .first()
            .map(|(v, n)| (v.clone(), Value::Number(*n as f64)))
            .unwrap_or((Value::Null, Value::Null));

        let ordered = present
            .iter()
            .all(|v| matches!(v, Value::Number(_) | Value::Timestamp(_)));
        let (min, max) = if ordered && !present.is_empty() {
            extremes(&present)
        } else {
            (Value::Null, Value::Null)
        };

        let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_number()).collect();
        let mean = if !numbers.is_empty() && numbers.len() == present.len() {
            Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
        } else {
            Value::Null
        };

        table.push(vec![
            Value::Text(column.to_string()),
            Value::Number(present.len() as f64),
            Value::Number(freq.len() as f64),
            top,
            top_n,
            min,
            max,
            mean,
        ]);
    }
    table
}

fn extremes(values: &[&Value]) -> (Value, Value) {
    let cmp = |a: &&&Value, b: &&&Value| {
        a.compare(b, "").ok().flatten().unwrap_or(Ordering::Equal)
    };
    let min = values.iter().min_by(cmp).map(|v| (**v).clone()).unwrap_or(Value::Null);
    let max = values.iter().max_by(cmp).map(|v| (**v).clone()).unwrap_or(Value::Null);
    (min, max)
}

fn value_counts(sheet: &str, rows: &[&dyn Record], column: &str) -> Table {
    let mut table = Table::new(sheet, &[column, "count"]);
    for (v, n) in frequencies(&column_values(rows, column), true) {
        table.push(vec![v, Value::Number(n as f64)]);
    }
    table
}

fn missing_counts(entity: Entity, rows: &[&dyn Record]) -> Table {
    let mut table = Table::new(format!("{entity}_missing"), &["column", "missing_count"]);
    for column in entity.columns() {
        let missing = column_values(rows, column).iter().filter(|v| v.is_null()).count();
        table.push(vec![Value::Text(column.to_string()), Value::Number(missing as f64)]);
    }
    table
}

/// Every row that has at least one exact copy elsewhere (all copies kept).
fn duplicate_rows(entity: Entity, rows: &[&dyn Record]) -> Table {
    let mut table = Table::new(format!("{entity}_duplicates"), entity.columns());
    let keyed: Vec<(Vec<ValueKey>, Vec<Value>)> = rows
        .iter()
        .map(|r| {
            let values = r.values();
            (values.iter().map(Value::key).collect(), values)
        })
        .collect();

    let mut counts: HashMap<&[ValueKey], usize> = HashMap::new();
    for (k, _) in &keyed {
        *counts.entry(k.as_slice()).or_insert(0) += 1;
    }
    for (k, values) in &keyed {
        if counts.get(k.as_slice()).copied().unwrap_or(0) >= 2 {
            table.push(values.clone());
        }
    }
    table
}
