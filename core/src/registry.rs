//! The rule registry.
//!
//! REGISTRATION ORDER (fixed, documented, never reordered):
//!   1.  customers_unique            key cardinality of customers
//!   2.  duplicate_customer_ids      uniqueness of customers.customer_id
//!   3.  subs_invalid_customers      subscriptions -> customers
//!   4.  events_invalid_customers    events -> customers
//!   5.  invalid_prices              monthly_price <= 0
//!   6.  invalid_dates               start_date > end_date
//!   7.  multiple_signups            >1 signup event per customer
//!   8.  invalid_event_dates         event_date < customer signup_date
//!   9.  active_with_end             active subscription with end_date
//!   10. canceled_without_end        canceled subscription without end_date
//!   11. customers_no_subs           coverage gap customers/subscriptions
//!   12. customers_no_events         coverage gap customers/events
//!   13. subs_no_events              coverage gap subscriptions/events
//!   14. future_customers            signup_date after cutoff
//!   15. future_subs_start           start_date after cutoff
//!   16. future_subs_end             end_date after cutoff
//!   17. future_events               event_date after cutoff
//!   18. event_sequence_issues       lifecycle events before signup
//!   19. signup_mismatch             customer signup_date != signup event date
//!
//! Order does not affect any rule's result; it fixes the report layout.

use crate::{
    error::{ValError, ValResult},
    model::{
        Entity, EVENT_ACTIVATED, EVENT_CHURNED, EVENT_SIGNUP, EVENT_TRIAL_START, STATUS_ACTIVE,
        STATUS_CANCELED,
    },
    rule::ValidationRule,
    rules::{
        ChildPrecedesParent, Comparison, CoverageGap, FieldEqualityCrossEntity, FutureDateCheck,
        KeyCardinality, Operand, OrderConstraint, Presence, RangeCheck, ReferentialIntegrity,
        RepeatedOccurrence, RowFilter, StateConsistency, TemporalOrdering, Uniqueness,
    },
    value::Value,
};

#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Names must be unique: they key the report.
    pub fn register(&mut self, rule: Box<dyn ValidationRule>) -> ValResult<()> {
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(ValError::DuplicateRule { name: rule.name().to_string() });
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[Box<dyn ValidationRule>] {
        &self.rules
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The full customer/subscription/event catalog in documented order.
    pub fn standard() -> ValResult<Self> {
        use Entity::{Customers, Events, Subscriptions};

        let mut reg = Self::new();
        reg.register(Box::new(KeyCardinality::new("customers_unique", Customers, "customer_id")))?;
        reg.register(Box::new(Uniqueness::new(
            "duplicate_customer_ids",
            Customers,
            "customer_id",
        )))?;
        reg.register(Box::new(ReferentialIntegrity::new(
            "subs_invalid_customers",
            Subscriptions,
            Customers,
            "customer_id",
        )))?;
        reg.register(Box::new(ReferentialIntegrity::new(
            "events_invalid_customers",
            Events,
            Customers,
            "customer_id",
        )))?;
        reg.register(Box::new(RangeCheck::new(
            "invalid_prices",
            Subscriptions,
            "monthly_price",
            Comparison::Le,
            Operand::Constant(Value::Number(0.0)),
        )))?;
        reg.register(Box::new(RangeCheck::new(
            "invalid_dates",
            Subscriptions,
            "start_date",
            Comparison::Gt,
            Operand::Column("end_date".into()),
        )))?;
        reg.register(Box::new(RepeatedOccurrence::new(
            "multiple_signups",
            Events,
            "customer_id",
            Some(RowFilter::new("event_type", EVENT_SIGNUP)),
        )))?;
        reg.register(Box::new(ChildPrecedesParent {
            name:         "invalid_event_dates".into(),
            child:        Events,
            child_field:  "event_date".into(),
            parent:       Customers,
            parent_field: "signup_date".into(),
            key:          "customer_id".into(),
        }))?;
        reg.register(Box::new(StateConsistency::new(
            "active_with_end",
            Subscriptions,
            "status",
            STATUS_ACTIVE,
            "end_date",
            Presence::Absent,
        )))?;
        reg.register(Box::new(StateConsistency::new(
            "canceled_without_end",
            Subscriptions,
            "status",
            STATUS_CANCELED,
            "end_date",
            Presence::Present,
        )))?;
        for (name, entity, reference) in [
            ("customers_no_subs", Customers, Subscriptions),
            ("customers_no_events", Customers, Events),
            ("subs_no_events", Subscriptions, Events),
        ] {
            reg.register(Box::new(CoverageGap::new(name, entity, reference, "customer_id")))?;
        }
        for (name, entity, column) in [
            ("future_customers", Customers, "signup_date"),
            ("future_subs_start", Subscriptions, "start_date"),
            ("future_subs_end", Subscriptions, "end_date"),
            ("future_events", Events, "event_date"),
        ] {
            reg.register(Box::new(FutureDateCheck::new(name, entity, column)))?;
        }
        reg.register(Box::new(TemporalOrdering::new(
            "event_sequence_issues",
            EVENT_SIGNUP,
            vec![
                OrderConstraint::new(EVENT_TRIAL_START, "trial_before_signup"),
                OrderConstraint::new(EVENT_ACTIVATED, "activated_before_signup"),
                OrderConstraint::new(EVENT_CHURNED, "churned_before_signup"),
            ],
        )))?;
        reg.register(Box::new(FieldEqualityCrossEntity {
            name:         "signup_mismatch".into(),
            left:         Customers,
            left_field:   "signup_date".into(),
            right:        Events,
            right_field:  "event_date".into(),
            join_key:     "customer_id".into(),
            right_filter: Some(RowFilter::new("event_type", EVENT_SIGNUP)),
            right_alias:  "event_signup_date".into(),
        }))?;
        Ok(reg)
    }
}
