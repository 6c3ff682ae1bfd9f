//! Event ordering and cross-entity date rules.

use chrono::NaiveDate;
use dataval_core::{
    model::{Customer, Datasets, Entity, Event},
    rule::{RuleContext, ValidationRule},
    rules::{
        ChildPrecedesParent, FieldEqualityCrossEntity, OrderConstraint, RowFilter,
        TemporalOrdering,
    },
    types::Timestamp,
    value::Value,
};

fn day(d: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn ctx() -> RuleContext {
    RuleContext::new(day(31))
}

fn event(id: &str, kind: &str, d: u32) -> Event {
    Event {
        customer_id: id.into(),
        event_type:  Some(kind.into()),
        event_date:  Some(day(d)),
        source:      None,
    }
}

fn customer(id: &str, signup: Option<u32>) -> Customer {
    Customer {
        customer_id:   id.into(),
        segment:       None,
        country:       None,
        is_enterprise: None,
        signup_date:   signup.map(day),
    }
}

fn sequence_rule() -> TemporalOrdering {
    TemporalOrdering::new(
        "event_sequence_issues",
        "signup",
        vec![
            OrderConstraint::new("trial_start", "trial_before_signup"),
            OrderConstraint::new("activated", "activated_before_signup"),
            OrderConstraint::new("churned", "churned_before_signup"),
        ],
    )
}

fn signup_mismatch() -> FieldEqualityCrossEntity {
    FieldEqualityCrossEntity {
        name:         "signup_mismatch".into(),
        left:         Entity::Customers,
        left_field:   "signup_date".into(),
        right:        Entity::Events,
        right_field:  "event_date".into(),
        join_key:     "customer_id".into(),
        right_filter: Some(RowFilter::new("event_type", "signup")),
        right_alias:  "event_signup_date".into(),
    }
}

#[test]
fn trial_before_signup_is_reported() {
    let data = Datasets {
        events: vec![event("1", "signup", 10), event("1", "trial_start", 5)],
        ..Default::default()
    };
    let set = sequence_rule().evaluate(&data, &ctx()).unwrap();
    assert_eq!(set.columns, vec!["customer_id", "issues"]);
    assert_eq!(set.len(), 1);
    assert_eq!(
        set.records[0].values,
        vec![Value::Text("1".into()), Value::Text("trial_before_signup".into())]
    );
}

#[test]
fn trial_after_signup_is_clean() {
    let data = Datasets {
        events: vec![event("1", "signup", 10), event("1", "trial_start", 15)],
        ..Default::default()
    };
    assert!(sequence_rule().evaluate(&data, &ctx()).unwrap().is_empty());
}

#[test]
fn same_day_is_not_before() {
    let data = Datasets {
        events: vec![event("1", "signup", 10), event("1", "activated", 10)],
        ..Default::default()
    };
    assert!(sequence_rule().evaluate(&data, &ctx()).unwrap().is_empty());
}

#[test]
fn customers_without_signup_event_are_skipped() {
    let data = Datasets {
        events: vec![event("7", "trial_start", 1), event("7", "churned", 2)],
        ..Default::default()
    };
    assert!(sequence_rule().evaluate(&data, &ctx()).unwrap().is_empty());
}

#[test]
fn several_issues_are_joined_in_constraint_order() {
    let data = Datasets {
        events: vec![
            event("2", "churned", 3),
            event("2", "signup", 20),
            event("2", "trial_start", 4),
            event("3", "signup", 1),
            event("3", "trial_start", 2),
        ],
        ..Default::default()
    };
    let set = sequence_rule().evaluate(&data, &ctx()).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(
        set.column_values("issues"),
        vec![Value::Text("trial_before_signup, churned_before_signup".into())]
    );
}

#[test]
fn flagged_customers_are_listed_in_id_order() {
    let data = Datasets {
        events: vec![
            event("12", "signup", 8),
            event("12", "trial_start", 2),
            event("3", "signup", 8),
            event("3", "activated", 1),
        ],
        ..Default::default()
    };
    let set = sequence_rule().evaluate(&data, &ctx()).unwrap();
    assert_eq!(
        set.column_values("customer_id"),
        vec![Value::Text("3".into()), Value::Text("12".into())]
    );
}

#[test]
fn earliest_signup_is_the_anchor() {
    // Second signup is later; trial is after the first one.
    let data = Datasets {
        events: vec![
            event("4", "signup", 2),
            event("4", "trial_start", 5),
            event("4", "signup", 9),
        ],
        ..Default::default()
    };
    assert!(sequence_rule().evaluate(&data, &ctx()).unwrap().is_empty());
}

#[test]
fn signup_mismatch_compares_exact_dates() {
    let data = Datasets {
        customers: vec![customer("1", Some(1)), customer("2", Some(2)), customer("3", None)],
        events: vec![
            event("1", "signup", 1),
            event("2", "signup", 3),
            event("2", "activated", 2),
            event("3", "signup", 3),
        ],
        ..Default::default()
    };
    let set = signup_mismatch().evaluate(&data, &ctx()).unwrap();
    assert_eq!(set.columns, vec!["customer_id", "signup_date", "event_signup_date"]);
    assert_eq!(set.len(), 1);
    assert_eq!(
        set.records[0].values,
        vec![Value::Text("2".into()), Value::Timestamp(day(2)), Value::Timestamp(day(3))]
    );
}

#[test]
fn signup_mismatch_flags_customer_without_signup_event() {
    let data = Datasets {
        customers: vec![customer("5", Some(1))],
        events: vec![event("5", "activated", 1)],
        ..Default::default()
    };
    let set = signup_mismatch().evaluate(&data, &ctx()).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.records[0].values[2], Value::Null);
}

#[test]
fn events_before_signup_date_are_flagged_with_parent_date() {
    let data = Datasets {
        customers: vec![customer("1", Some(10)), customer("2", None)],
        events: vec![
            event("1", "signup", 10),
            event("1", "trial_start", 9),
            event("2", "signup", 1),
            event("9", "signup", 1),
        ],
        ..Default::default()
    };
    let rule = ChildPrecedesParent {
        name:         "invalid_event_dates".into(),
        child:        Entity::Events,
        child_field:  "event_date".into(),
        parent:       Entity::Customers,
        parent_field: "signup_date".into(),
        key:          "customer_id".into(),
    };
    let set = rule.evaluate(&data, &ctx()).unwrap();
    assert_eq!(
        set.columns,
        vec!["customer_id", "event_type", "event_date", "source", "signup_date"]
    );
    assert_eq!(set.len(), 1);
    assert_eq!(set.column_values("event_type"), vec![Value::Text("trial_start".into())]);
    assert_eq!(set.column_values("signup_date"), vec![Value::Timestamp(day(10))]);
}
