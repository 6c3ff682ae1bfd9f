//! The three datasets under validation and their column-level view.
//!
//! Records are immutable snapshots. Rules never touch the typed fields
//! directly; they go through `Record::value` so that a rule can be
//! pointed at any entity/column pair.

use crate::{
    error::{RuleError, RuleResult},
    types::{CustomerId, Timestamp},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CANCELED: &str = "canceled";

pub const EVENT_SIGNUP: &str = "signup";
pub const EVENT_TRIAL_START: &str = "trial_start";
pub const EVENT_ACTIVATED: &str = "activated";
pub const EVENT_CHURNED: &str = "churned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Customers,
    Subscriptions,
    Events,
}

impl Entity {
    pub const ALL: [Entity; 3] = [Entity::Customers, Entity::Subscriptions, Entity::Events];

    /// Column order used by the report, the store, and duplicate detection.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Entity::Customers => {
                &["customer_id", "segment", "country", "is_enterprise", "signup_date"]
            }
            Entity::Subscriptions => {
                &["customer_id", "status", "monthly_price", "start_date", "end_date"]
            }
            Entity::Events => &["customer_id", "event_type", "event_date", "source"],
        }
    }

    /// Columns parsed as timestamps at load time.
    pub fn date_columns(&self) -> &'static [&'static str] {
        match self {
            Entity::Customers     => &["signup_date"],
            Entity::Subscriptions => &["start_date", "end_date"],
            Entity::Events        => &["event_date"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Entity::Customers     => "customers",
            Entity::Subscriptions => "subscriptions",
            Entity::Events        => "events",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column-addressable row.
pub trait Record {
    fn entity(&self) -> Entity;

    fn customer_id(&self) -> &str;

    /// `None` when the entity has no such column.
    fn value(&self, column: &str) -> Option<Value>;

    /// Every column in `Entity::columns` order.
    fn values(&self) -> Vec<Value> {
        self.entity()
            .columns()
            .iter()
            .map(|c| self.value(c).unwrap_or(Value::Null))
            .collect()
    }
}

/// Look up `column` on `record`, turning an unknown column into a rule error.
pub fn field(record: &dyn Record, column: &str) -> RuleResult<Value> {
    record.value(column).ok_or_else(|| RuleError::UnknownColumn {
        entity: record.entity().to_string(),
        column: column.to_string(),
    })
}

/// Fail fast when a rule is configured with a column the entity lacks,
/// even if the dataset happens to be empty.
pub fn require_column(entity: Entity, column: &str) -> RuleResult<()> {
    if entity.columns().contains(&column) {
        Ok(())
    } else {
        Err(RuleError::UnknownColumn {
            entity: entity.to_string(),
            column: column.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id:   CustomerId,
    pub segment:       Option<String>,
    pub country:       Option<String>,
    pub is_enterprise: Option<bool>,
    pub signup_date:   Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub customer_id:   CustomerId,
    pub status:        Option<String>, // active | canceled | ...
    pub monthly_price: Option<f64>,
    pub start_date:    Option<Timestamp>,
    pub end_date:      Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub customer_id: CustomerId,
    pub event_type:  Option<String>, // signup | trial_start | activated | churned | ...
    pub event_date:  Option<Timestamp>,
    pub source:      Option<String>,
}

impl Record for Customer {
    fn entity(&self) -> Entity {
        Entity::Customers
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn value(&self, column: &str) -> Option<Value> {
        let v = match column {
            "customer_id"   => Value::Text(self.customer_id.clone()),
            "segment"       => self.segment.clone().into(),
            "country"       => self.country.clone().into(),
            "is_enterprise" => self.is_enterprise.into(),
            "signup_date"   => self.signup_date.into(),
            _ => return None,
        };
        Some(v)
    }
}

impl Record for Subscription {
    fn entity(&self) -> Entity {
        Entity::Subscriptions
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn value(&self, column: &str) -> Option<Value> {
        let v = match column {
            "customer_id"   => Value::Text(self.customer_id.clone()),
            "status"        => self.status.clone().into(),
            "monthly_price" => self.monthly_price.into(),
            "start_date"    => self.start_date.into(),
            "end_date"      => self.end_date.into(),
            _ => return None,
        };
        Some(v)
    }
}

impl Record for Event {
    fn entity(&self) -> Entity {
        Entity::Events
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn value(&self, column: &str) -> Option<Value> {
        let v = match column {
            "customer_id" => Value::Text(self.customer_id.clone()),
            "event_type"  => self.event_type.clone().into(),
            "event_date"  => self.event_date.into(),
            "source"      => self.source.clone().into(),
            _ => return None,
        };
        Some(v)
    }
}

/// The three loaded datasets. Read-only for the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub customers:     Vec<Customer>,
    pub subscriptions: Vec<Subscription>,
    pub events:        Vec<Event>,
}

impl Datasets {
    pub fn rows(&self, entity: Entity) -> Vec<&dyn Record> {
        match entity {
            Entity::Customers     => self.customers.iter().map(|r| r as &dyn Record).collect(),
            Entity::Subscriptions => self.subscriptions.iter().map(|r| r as &dyn Record).collect(),
            Entity::Events        => self.events.iter().map(|r| r as &dyn Record).collect(),
        }
    }

    pub fn row_count(&self, entity: Entity) -> usize {
        match entity {
            Entity::Customers     => self.customers.len(),
            Entity::Subscriptions => self.subscriptions.len(),
            Entity::Events        => self.events.len(),
        }
    }
}
