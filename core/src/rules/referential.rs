use super::key_set;
use crate::{
    error::RuleResult,
    exception::ExceptionSet,
    model::{field, require_column, Datasets, Entity},
    rule::{RuleContext, ValidationRule},
};

/// Rows of `entity` whose `key` has no match anywhere in `reference`.
fn unmatched(
    rule: &str,
    data: &Datasets,
    entity: Entity,
    reference: Entity,
    key: &str,
) -> RuleResult<ExceptionSet> {
    require_column(entity, key)?;
    let known = key_set(data, reference, key)?;

    let mut orphans = Vec::new();
    for row in data.rows(entity) {
        if !known.contains(&field(row, key)?.key()) {
            orphans.push(row);
        }
    }
    Ok(ExceptionSet::from_records(rule, entity.columns(), &orphans))
}

/// Child rows pointing at a parent key that does not exist.
pub struct ReferentialIntegrity {
    pub name:   String,
    pub child:  Entity,
    pub parent: Entity,
    pub key:    String,
}

impl ReferentialIntegrity {
    pub fn new(name: &str, child: Entity, parent: Entity, key: &str) -> Self {
        Self { name: name.into(), child, parent, key: key.into() }
    }
}

impl ValidationRule for ReferentialIntegrity {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        unmatched(&self.name, data, self.child, self.parent, &self.key)
    }
}

/// Rows of `entity` with zero related rows in `reference`
/// (e.g. customers that never subscribed).
pub struct CoverageGap {
    pub name:      String,
    pub entity:    Entity,
    pub reference: Entity,
    pub key:       String,
}

impl CoverageGap {
    pub fn new(name: &str, entity: Entity, reference: Entity, key: &str) -> Self {
        Self { name: name.into(), entity, reference, key: key.into() }
    }
}

impl ValidationRule for CoverageGap {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        unmatched(&self.name, data, self.entity, self.reference, &self.key)
    }
}
