use crate::{
    error::RuleResult,
    exception::ExceptionSet,
    model::{field, require_column, Datasets, Entity, Record},
    rule::{RuleContext, ValidationRule},
    value::Value,
};
use std::cmp::Ordering;

/// The violation predicate: a row is flagged when `field <cmp> operand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Comparison::Lt => ord == Ordering::Less,
            Comparison::Le => ord != Ordering::Greater,
            Comparison::Gt => ord == Ordering::Greater,
            Comparison::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Constant(Value),
    /// Another column of the same row.
    Column(String),
}

/// Rows violating a numeric or date predicate, e.g. `monthly_price <= 0`
/// or `start_date > end_date`. A null on either side never flags.
pub struct RangeCheck {
    pub name:       String,
    pub entity:     Entity,
    pub field:      String,
    pub comparison: Comparison,
    pub operand:    Operand,
}

impl RangeCheck {
    pub fn new(
        name: &str,
        entity: Entity,
        field: &str,
        comparison: Comparison,
        operand: Operand,
    ) -> Self {
        Self {
            name: name.into(),
            entity,
            field: field.into(),
            comparison,
            operand,
        }
    }
}

impl ValidationRule for RangeCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.field)?;
        if let Operand::Column(other) = &self.operand {
            require_column(self.entity, other)?;
        }

        let mut flagged = Vec::new();
        for row in data.rows(self.entity) {
            let rhs = match &self.operand {
                Operand::Constant(v) => v.clone(),
                Operand::Column(c)   => field(row, c)?,
            };
            if violates(row, &self.field, self.comparison, &rhs)? {
                flagged.push(row);
            }
        }
        Ok(ExceptionSet::from_records(&self.name, self.entity.columns(), &flagged))
    }
}

/// Rows whose date `field` lies after the run's cutoff.
pub struct FutureDateCheck {
    pub name:   String,
    pub entity: Entity,
    pub field:  String,
}

impl FutureDateCheck {
    pub fn new(name: &str, entity: Entity, field: &str) -> Self {
        Self { name: name.into(), entity, field: field.into() }
    }
}

impl ValidationRule for FutureDateCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.field)?;
        let cutoff = Value::Timestamp(ctx.cutoff);

        let mut flagged = Vec::new();
        for row in data.rows(self.entity) {
            if violates(row, &self.field, Comparison::Gt, &cutoff)? {
                flagged.push(row);
            }
        }
        Ok(ExceptionSet::from_records(&self.name, self.entity.columns(), &flagged))
    }
}

fn violates(row: &dyn Record, column: &str, cmp: Comparison, rhs: &Value) -> RuleResult<bool> {
    let lhs = field(row, column)?;
    Ok(lhs.compare(rhs, column)?.is_some_and(|ord| cmp.holds(ord)))
}
