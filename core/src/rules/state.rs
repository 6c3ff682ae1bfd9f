use crate::{
    error::RuleResult,
    exception::ExceptionSet,
    model::{field, require_column, Datasets, Entity},
    rule::{RuleContext, ValidationRule},
    value::Value,
};

/// What a status requires of the dependent column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// Rows in `status` whose `field` presence does not match `expect`,
/// e.g. active subscriptions carrying an `end_date`.
pub struct StateConsistency {
    pub name:         String,
    pub entity:       Entity,
    pub status_field: String,
    pub status:       String,
    pub field:        String,
    pub expect:       Presence,
}

impl StateConsistency {
    pub fn new(
        name: &str,
        entity: Entity,
        status_field: &str,
        status: &str,
        field: &str,
        expect: Presence,
    ) -> Self {
        Self {
            name: name.into(),
            entity,
            status_field: status_field.into(),
            status: status.into(),
            field: field.into(),
            expect,
        }
    }
}

impl ValidationRule for StateConsistency {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.entity, &self.status_field)?;
        require_column(self.entity, &self.field)?;

        let mut flagged = Vec::new();
        for row in data.rows(self.entity) {
            let status = field(row, &self.status_field)?;
            let in_status = matches!(status, Value::Text(s) if s == self.status);
            if !in_status {
                continue;
            }
            let present = !field(row, &self.field)?.is_null();
            let ok = match self.expect {
                Presence::Present => present,
                Presence::Absent  => !present,
            };
            if !ok {
                flagged.push(row);
            }
        }
        Ok(ExceptionSet::from_records(&self.name, self.entity.columns(), &flagged))
    }
}
