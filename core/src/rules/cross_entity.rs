use super::{filtered_rows, RowFilter};
use crate::{
    error::RuleResult,
    exception::ExceptionSet,
    model::{field, require_column, Datasets, Entity},
    rule::{RuleContext, ValidationRule},
    value::{Value, ValueKey},
};
use std::{cmp::Ordering, collections::HashMap};

/// `right_field` values per join key, in right-side row order.
fn index_by_key(
    data: &Datasets,
    entity: Entity,
    key: &str,
    value_field: &str,
    filter: Option<&RowFilter>,
) -> RuleResult<HashMap<ValueKey, Vec<Value>>> {
    require_column(entity, key)?;
    require_column(entity, value_field)?;
    let mut index: HashMap<ValueKey, Vec<Value>> = HashMap::new();
    for row in filtered_rows(data, entity, filter)? {
        let k = field(row, key)?.key();
        index.entry(k).or_default().push(field(row, value_field)?);
    }
    Ok(index)
}

/// Exact equality between `left.left_field` and the related
/// `right.right_field` reached through `join_key`.
///
/// Left rows with a null `left_field` are not checked. Every remaining
/// left row is joined to every matching (filtered) right row; a pair is
/// flagged unless both values are present and exactly equal. A left row
/// with no right match is flagged once with a null right value.
pub struct FieldEqualityCrossEntity {
    pub name:         String,
    pub left:         Entity,
    pub left_field:   String,
    pub right:        Entity,
    pub right_field:  String,
    pub join_key:     String,
    pub right_filter: Option<RowFilter>,
    /// Output header for the right-hand value.
    pub right_alias:  String,
}

impl ValidationRule for FieldEqualityCrossEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.left, &self.join_key)?;
        require_column(self.left, &self.left_field)?;
        let right = index_by_key(
            data,
            self.right,
            &self.join_key,
            &self.right_field,
            self.right_filter.as_ref(),
        )?;

        let mut set = ExceptionSet::new(
            &self.name,
            vec![self.join_key.clone(), self.left_field.clone(), self.right_alias.clone()],
        );
        for row in data.rows(self.left) {
            let lv = field(row, &self.left_field)?;
            if lv.is_null() {
                continue;
            }
            let key = field(row, &self.join_key)?;
            match right.get(&key.key()) {
                None => set.push(vec![key, lv, Value::Null]),
                Some(matches) => {
                    for rv in matches {
                        if lv.compare(rv, &self.left_field)? != Some(Ordering::Equal) {
                            set.push(vec![key.clone(), lv.clone(), rv.clone()]);
                        }
                    }
                }
            }
        }
        Ok(set)
    }
}

/// Child rows dated before their parent's date, e.g. events earlier than
/// the owning customer's `signup_date`. Parents with a null date are not
/// joined. Output: the child's columns followed by `parent_field`.
pub struct ChildPrecedesParent {
    pub name:         String,
    pub child:        Entity,
    pub child_field:  String,
    pub parent:       Entity,
    pub parent_field: String,
    pub key:          String,
}

impl ValidationRule for ChildPrecedesParent {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &Datasets, _ctx: &RuleContext) -> RuleResult<ExceptionSet> {
        require_column(self.child, &self.key)?;
        require_column(self.child, &self.child_field)?;
        let mut parents = index_by_key(data, self.parent, &self.key, &self.parent_field, None)?;
        for dates in parents.values_mut() {
            dates.retain(|v| !v.is_null());
        }

        let mut columns: Vec<String> = self.child.columns().iter().map(|c| c.to_string()).collect();
        columns.push(self.parent_field.clone());
        let mut set = ExceptionSet::new(&self.name, columns);

        for row in data.rows(self.child) {
            let Some(dates) = parents.get(&field(row, &self.key)?.key()) else {
                continue;
            };
            let cv = field(row, &self.child_field)?;
            for pv in dates {
                if cv.compare(pv, &self.child_field)? == Some(Ordering::Less) {
                    let mut values = row.values();
                    values.push(pv.clone());
                    set.push(values);
                }
            }
        }
        Ok(set)
    }
}
