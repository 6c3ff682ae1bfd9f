//! The rule catalog.
//!
//! Each rule type is parameterized by entity and column names so the
//! same logic backs several registry entries (e.g. one `FutureDateCheck`
//! per date column). Column names are checked when the rule runs.

mod cross_entity;
mod range;
mod referential;
mod state;
mod temporal;
mod uniqueness;

pub use cross_entity::{ChildPrecedesParent, FieldEqualityCrossEntity};
pub use range::{Comparison, FutureDateCheck, Operand, RangeCheck};
pub use referential::{CoverageGap, ReferentialIntegrity};
pub use state::{Presence, StateConsistency};
pub use temporal::{OrderConstraint, TemporalOrdering};
pub use uniqueness::{KeyCardinality, RepeatedOccurrence, Uniqueness};

use crate::{
    error::RuleResult,
    model::{field, require_column, Datasets, Entity, Record},
    value::{Value, ValueKey},
};
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

/// Restricts a rule to rows where `column == equals`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub equals: Value,
}

impl RowFilter {
    pub fn new(column: &str, equals: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            equals: equals.into(),
        }
    }

    pub fn matches(&self, record: &dyn Record) -> RuleResult<bool> {
        let v = field(record, &self.column)?;
        Ok(v.compare(&self.equals, &self.column)? == Some(std::cmp::Ordering::Equal))
    }
}

/// Rows of `entity` passing the optional filter, in input order.
fn filtered_rows<'a>(
    data: &'a Datasets,
    entity: Entity,
    filter: Option<&RowFilter>,
) -> RuleResult<Vec<&'a dyn Record>> {
    let rows = data.rows(entity);
    let Some(filter) = filter else {
        return Ok(rows);
    };
    require_column(entity, &filter.column)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if filter.matches(row)? {
            out.push(row);
        }
    }
    Ok(out)
}

/// Distinct key values present in `entity`.
fn key_set(data: &Datasets, entity: Entity, key: &str) -> RuleResult<HashSet<ValueKey>> {
    require_column(entity, key)?;
    data.rows(entity)
        .into_iter()
        .map(|r| field(r, key).map(|v| v.key()))
        .collect()
}

/// Occurrence count per key value, plus first-appearance order.
fn key_counts(
    rows: &[&dyn Record],
    key: &str,
) -> RuleResult<(HashMap<ValueKey, usize>, Vec<(ValueKey, Value)>)> {
    let mut counts: HashMap<ValueKey, usize> = HashMap::new();
    let mut order = Vec::new();
    for row in rows {
        let v = field(*row, key)?;
        let k = v.key();
        let n = counts.entry(k.clone()).or_insert(0);
        if *n == 0 {
            order.push((k, v));
        }
        *n += 1;
    }
    Ok((counts, order))
}

/// Output order of grouped keys. Numeric keys (including numeric text
/// such as customer ids) sort by value and come first; the rest sort
/// by their natural order.
fn key_order(a: &Value, b: &Value) -> Ordering {
    let numeric = |v: &Value| match v {
        Value::Number(n) => Some(*n),
        Value::Text(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.key().cmp(&b.key()),
    }
}
