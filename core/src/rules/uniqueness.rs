use super::{filtered_rows, key_counts, key_order, RowFilter};
use crate::{
    error::RuleResult,
    exception::ExceptionSet,
    model::{field, require_column, Datasets, Entity},
    rule::{RuleContext, ValidationRule},
    value::Value,
};

/// Every row whose key value appears more than once (all copies kept).
pub struct Uniqueness {
    pub name:   String,
    pub entity: Entity,
    pub key:    String,
}

impl Uniqueness {
    pub fn new(name: &str, entity: Entity, key: &str) -> Self {
        Self { name: name.into(), entity, key: key.into() }
    }
}

impl ValidationRule for Uniqueness {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.key)?;
        let rows = data.rows(self.entity);
        let (counts, _) = key_counts(&rows, &self.key)?;

        let mut dupes = Vec::new();
        for row in &rows {
            let k = field(*row, &self.key)?.key();
            if counts.get(&k).copied().unwrap_or(0) >= 2 {
                dupes.push(*row);
            }
        }
        Ok(ExceptionSet::from_records(&self.name, self.entity.columns(), &dupes))
    }
}

/// Single summary row: distinct key count against total row count.
pub struct KeyCardinality {
    pub name:   String,
    pub entity: Entity,
    pub key:    String,
}

impl KeyCardinality {
    pub fn new(name: &str, entity: Entity, key: &str) -> Self {
        Self { name: name.into(), entity, key: key.into() }
    }
}

impl ValidationRule for KeyCardinality {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.key)?;
        let rows = data.rows(self.entity);
        let (_, order) = key_counts(&rows, &self.key)?;

        let mut set = ExceptionSet::new(
            &self.name,
            vec!["unique_count".into(), "total_rows".into()],
        );
        set.push(vec![
            Value::Number(order.len() as f64),
            Value::Number(rows.len() as f64),
        ]);
        Ok(set)
    }
}

/// Aggregate `key, count` for keys with two or more (filtered) rows,
/// in sorted key order.
pub struct RepeatedOccurrence {
    pub name:   String,
    pub entity: Entity,
    pub key:    String,
    pub filter: Option<RowFilter>,
}

impl RepeatedOccurrence {
    pub fn new(name: &str, entity: Entity, key: &str, filter: Option<RowFilter>) -> Self {
        Self { name: name.into(), entity, key: key.into(), filter }
    }
}

impl ValidationRule for RepeatedOccurrence {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.key)?;
        let rows = filtered_rows(data, self.entity, self.filter.as_ref())?;
        let (counts, mut order) = key_counts(&rows, &self.key)?;
        order.sort_by(|a, b| key_order(&a.1, &b.1));

        let mut set = ExceptionSet::new(&self.name, vec![self.key.clone(), "count".into()]);
        for (k, v) in order {
            let n = counts[&k];
            if n >= 2 {
                set.push(vec![v, Value::Number(n as f64)]);
            }
        }
        Ok(set)
    }
}
