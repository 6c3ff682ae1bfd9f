use super::key_order;
use crate::{
    error::RuleResult,
    exception::ExceptionSet,
    model::{field, require_column, Datasets, Entity, Record},
    rule::{RuleContext, ValidationRule},
    value::{Value, ValueKey},
};
use std::{cmp::Ordering, collections::HashMap};

/// An event type that must not occur before the anchor, and the issue
/// label reported when it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConstraint {
    pub event_type: String,
    pub issue:      String,
}

impl OrderConstraint {
    pub fn new(event_type: &str, issue: &str) -> Self {
        Self { event_type: event_type.into(), issue: issue.into() }
    }
}

/// Per-group event ordering against an anchor event.
///
/// Rows are grouped by `group_key`, groups in sorted key order. For each
/// group the earliest anchor timestamp is compared with the earliest
/// timestamp of every constrained type; a constrained type that is
/// strictly earlier adds its issue label. Groups without an anchor
/// event are skipped. Output columns: `<group_key>`, `issues`.
pub struct TemporalOrdering {
    pub name:        String,
    pub entity:      Entity,
    pub group_key:   String,
    pub type_field:  String,
    pub date_field:  String,
    pub anchor:      String,
    pub constraints: Vec<OrderConstraint>,
}

impl TemporalOrdering {
    pub fn new(name: &str, anchor: &str, constraints: Vec<OrderConstraint>) -> Self {
        Self {
            name:       name.into(),
            entity:     Entity::Events,
            group_key:  "customer_id".into(),
            type_field: "event_type".into(),
            date_field: "event_date".into(),
            anchor:     anchor.into(),
            constraints,
        }
    }

    /// Earliest non-null `date_field` among rows of `event_type`.
    fn earliest(&self, rows: &[&dyn Record], event_type: &str) -> RuleResult<Option<Value>> {
        let mut best: Option<Value> = None;
        for row in rows {
            let kind = field(*row, &self.type_field)?;
            let is_type = matches!(kind, Value::Text(t) if t == event_type);
            if !is_type {
                continue;
            }
            let date = field(*row, &self.date_field)?;
            if date.is_null() {
                continue;
            }
            best = match best {
                Some(cur) if cur.compare(&date, &self.date_field)? != Some(Ordering::Greater) => {
                    Some(cur)
                }
                _ => Some(date),
            };
        }
        Ok(best)
    }
}

impl ValidationRule for TemporalOrdering {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.group_key)?;
        require_column(self.entity, &self.type_field)?;
        require_column(self.entity, &self.date_field)?;

        let mut index: HashMap<ValueKey, usize> = HashMap::new();
        let mut groups: Vec<(Value, Vec<&dyn Record>)> = Vec::new();
        for row in data.rows(self.entity) {
            let key = field(row, &self.group_key)?;
            let slot = *index.entry(key.key()).or_insert_with(|| {
                groups.push((key.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(row);
        }
        groups.sort_by(|a, b| key_order(&a.0, &b.0));

        let mut set = ExceptionSet::new(&self.name, vec![self.group_key.clone(), "issues".into()]);
        for (key, rows) in &groups {
            let Some(anchor_at) = self.earliest(rows, &self.anchor)? else {
                continue;
            };

            let mut issues = Vec::new();
            for c in &self.constraints {
                if let Some(at) = self.earliest(rows, &c.event_type)? {
                    if at.compare(&anchor_at, &self.date_field)? == Some(Ordering::Less) {
                        issues.push(c.issue.as_str());
                    }
                }
            }

            if !issues.is_empty() {
                set.push(vec![key.clone(), Value::Text(issues.join(", "))]);
            }
        }
        Ok(set)
    }
}
