//! Registry ordering and per-rule failure isolation.

use chrono::NaiveDate;
use dataval_core::{
    error::{RuleError, RuleResult, ValError},
    exception::ExceptionSet,
    executor::{RuleExecutor, RuleOutcome},
    model::{Customer, Datasets, Entity},
    registry::RuleRegistry,
    rule::{RuleContext, ValidationRule},
    rules::{KeyCardinality, Uniqueness},
};

fn ctx() -> RuleContext {
    RuleContext::new(NaiveDate::from_ymd_opt(2026, 1, 9).unwrap().and_hms_opt(0, 0, 0).unwrap())
}

fn data() -> Datasets {
    let c = |id: &str| Customer {
        customer_id:   id.into(),
        segment:       None,
        country:       None,
        is_enterprise: None,
        signup_date:   None,
    };
    Datasets { customers: vec![c("1"), c("2"), c("2")], ..Default::default() }
}

struct Failing;

impl ValidationRule for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn evaluate(&self, _: &Datasets, _: &RuleContext) -> RuleResult<ExceptionSet> {
        Err(RuleError::Internal("boom".into()))
    }
}

struct Panicking;

impl ValidationRule for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn evaluate(&self, _: &Datasets, _: &RuleContext) -> RuleResult<ExceptionSet> {
        panic!("index out of range")
    }
}

#[test]
fn failures_are_isolated_and_the_batch_continues() {
    let mut reg = RuleRegistry::new();
    reg.register(Box::new(Failing)).unwrap();
    reg.register(Box::new(Uniqueness::new(
        "duplicate_customer_ids",
        Entity::Customers,
        "customer_id",
    )))
    .unwrap();
    reg.register(Box::new(Panicking)).unwrap();
    reg.register(Box::new(Uniqueness::new("bad_column", Entity::Customers, "no_such_column")))
        .unwrap();
    reg.register(Box::new(KeyCardinality::new(
        "customers_unique",
        Entity::Customers,
        "customer_id",
    )))
    .unwrap();

    let report = RuleExecutor::new(&reg).run(&data(), &ctx());

    let names: Vec<&str> = report.results.iter().map(|r| r.rule.as_str()).collect();
    assert_eq!(
        names,
        vec!["failing", "duplicate_customer_ids", "panicking", "bad_column", "customers_unique"]
    );

    match report.get("failing").unwrap() {
        RuleOutcome::Failed { cause } => assert!(cause.contains("boom")),
        other => panic!("expected failure, got {other:?}"),
    }
    match report.get("panicking").unwrap() {
        RuleOutcome::Failed { cause } => assert!(cause.contains("index out of range")),
        other => panic!("expected failure, got {other:?}"),
    }
    match report.get("bad_column").unwrap() {
        RuleOutcome::Failed { cause } => assert!(cause.contains("no_such_column")),
        other => panic!("expected failure, got {other:?}"),
    }

    assert_eq!(report.exceptions("duplicate_customer_ids").unwrap().len(), 2);
    assert_eq!(report.exceptions("customers_unique").unwrap().len(), 1);
    assert_eq!(report.failed().len(), 3);
}

#[test]
fn empty_results_are_kept() {
    let mut reg = RuleRegistry::new();
    reg.register(Box::new(Uniqueness::new("no_dupes", Entity::Events, "customer_id")))
        .unwrap();
    let report = RuleExecutor::new(&reg).run(&data(), &ctx());
    assert_eq!(report.results.len(), 1);
    assert!(report.exceptions("no_dupes").unwrap().is_empty());
    assert_eq!(report.total_exceptions(), 0);
}

#[test]
fn duplicate_rule_names_are_rejected() {
    let mut reg = RuleRegistry::new();
    reg.register(Box::new(Failing)).unwrap();
    let err = reg.register(Box::new(Failing)).unwrap_err();
    assert!(matches!(err, ValError::DuplicateRule { ref name } if name == "failing"));
    assert_eq!(reg.len(), 1);
}

#[test]
fn standard_registry_has_the_documented_order() {
    let reg = RuleRegistry::standard().unwrap();
    assert_eq!(
        reg.names(),
        vec![
            "customers_unique",
            "duplicate_customer_ids",
            "subs_invalid_customers",
            "events_invalid_customers",
            "invalid_prices",
            "invalid_dates",
            "multiple_signups",
            "invalid_event_dates",
            "active_with_end",
            "canceled_without_end",
            "customers_no_subs",
            "customers_no_events",
            "subs_no_events",
            "future_customers",
            "future_subs_start",
            "future_subs_end",
            "future_events",
            "event_sequence_issues",
            "signup_mismatch",
        ]
    );
}

#[test]
fn standard_rules_all_complete_on_empty_input() {
    let reg = RuleRegistry::standard().unwrap();
    let report = RuleExecutor::new(&reg).run(&Datasets::default(), &ctx());
    assert_eq!(report.results.len(), 19);
    assert!(report.failed().is_empty());
    // Cardinality always reports one summary row.
    assert_eq!(report.total_exceptions(), 1);
}
