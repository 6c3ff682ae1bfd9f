//! End-to-end runs: CSV in, report and tables out.

use chrono::NaiveDate;
use dataval_core::{
    config::{InputPaths, ValidationConfig},
    exception::ExceptionSet,
    model::{Customer, Datasets, Entity, Subscription},
    pipeline::ValidationPipeline,
    store::{TableLoadStatus, ValidationStore},
    types::Timestamp,
    value::Value,
};
use std::{fs, path::Path};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn write_inputs(dir: &Path) -> InputPaths {
    let customers = dir.join("customers.csv");
    let subscriptions = dir.join("subscriptions.csv");
    let events = dir.join("events.csv");
    fs::write(
        &customers,
        "customer_id,segment,country,is_enterprise,signup_date\n\
         1,smb,US,False,2024-01-05\n\
         2,enterprise,DE,True,2024-02-11\n\
         2,enterprise,DE,True,2024-02-11\n\
         3,smb,FR,False,2030-01-01\n",
    )
    .unwrap();
    fs::write(
        &subscriptions,
        "customer_id,status,monthly_price,start_date,end_date\n\
         1,active,49.0,2024-01-06,\n\
         2,canceled,-5,2024-02-12,\n\
         9,active,10,2024-03-01,2024-04-01\n\
         3,canceled,20,2027-01-01,2027-06-01\n",
    )
    .unwrap();
    fs::write(
        &events,
        "customer_id,event_type,event_date,source\n\
         1,signup,2024-01-05,web\n\
         1,trial_start,2024-01-01,web\n\
         2,signup,2024-02-12,sales\n\
         8,signup,2024-05-01,web\n",
    )
    .unwrap();
    InputPaths {
        customers:     customers.to_string_lossy().into_owned(),
        subscriptions: subscriptions.to_string_lossy().into_owned(),
        events:        events.to_string_lossy().into_owned(),
    }
}

fn config(dir: &TempDir) -> ValidationConfig {
    ValidationConfig {
        current_date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
        inputs:       write_inputs(dir.path()),
        report_path:  dir.path().join("out/validation_results.xlsx").to_string_lossy().into_owned(),
        database:     dir.path().join("analytics.db").to_string_lossy().into_owned(),
    }
}

fn count(set: Option<&ExceptionSet>) -> usize {
    set.map(|s| s.len()).unwrap_or(usize::MAX)
}

fn ids(set: Option<&ExceptionSet>) -> Vec<String> {
    set.map(|s| s.column_values("customer_id"))
        .unwrap_or_default()
        .iter()
        .map(|v| v.to_string())
        .collect()
}

#[test]
fn full_run_writes_report_and_tables() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let store = ValidationStore::open(&cfg.database).unwrap();
    store.migrate().unwrap();

    let pipeline = ValidationPipeline::build(cfg.clone()).unwrap();
    let outcome = pipeline.run(&store).unwrap();

    assert!(outcome.report_path.exists());
    assert!(outcome.persistence.committed);
    assert_eq!(
        outcome.stored_rows,
        vec![(Entity::Customers, 4), (Entity::Subscriptions, 4), (Entity::Events, 4)]
    );

    let v = &outcome.validation;
    assert_eq!(v.results.len(), 19);
    assert!(v.failed().is_empty());
    assert_eq!(count(v.exceptions("duplicate_customer_ids")), 2);
    assert_eq!(ids(v.exceptions("subs_invalid_customers")), vec!["9"]);
    assert_eq!(ids(v.exceptions("events_invalid_customers")), vec!["8"]);
    assert_eq!(count(v.exceptions("customers_no_subs")), 0);
    assert_eq!(ids(v.exceptions("customers_no_events")), vec!["3"]);
    assert_eq!(ids(v.exceptions("subs_no_events")), vec!["9", "3"]);
    assert_eq!(ids(v.exceptions("future_subs_start")), vec!["3"]);
    assert_eq!(ids(v.exceptions("future_subs_end")), vec!["3"]);
    assert_eq!(count(v.exceptions("future_events")), 0);
    assert_eq!(count(v.exceptions("invalid_prices")), 1);
    assert_eq!(count(v.exceptions("active_with_end")), 1);
    assert_eq!(count(v.exceptions("canceled_without_end")), 1);
    assert_eq!(ids(v.exceptions("future_customers")), vec!["3"]);
    assert_eq!(count(v.exceptions("event_sequence_issues")), 1);
    assert_eq!(count(v.exceptions("invalid_event_dates")), 1);
    // Customer 2 twice (signup date differs by a day), customer 3 has no signup event.
    assert_eq!(count(v.exceptions("signup_mismatch")), 3);

    let stored = store.rule_results(&outcome.run_id).unwrap();
    assert_eq!(stored.len(), 19);
    assert_eq!(stored[0].0, "customers_unique");
    assert_eq!(stored[4], ("invalid_prices".to_string(), "completed".to_string(), 1));
    assert_eq!(
        store.run_cutoff(&outcome.run_id).unwrap().as_deref(),
        Some("2026-01-09 00:00:00")
    );
}

#[test]
fn negative_price_on_active_subscription_without_end_date() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let data = Datasets {
        customers: vec![Customer {
            customer_id:   "1".into(),
            segment:       None,
            country:       None,
            is_enterprise: None,
            signup_date:   Some(date(2020, 1, 1)),
        }],
        subscriptions: vec![Subscription {
            customer_id:   "1".into(),
            status:        Some("active".into()),
            monthly_price: Some(-5.0),
            start_date:    Some(date(2020, 1, 2)),
            end_date:      None,
        }],
        ..Default::default()
    };

    let (_, report) = ValidationPipeline::build(cfg).unwrap().validate(&data);
    let prices = report.exceptions("invalid_prices").unwrap();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices.column_values("monthly_price"), vec![Value::Number(-5.0)]);
    assert!(report.exceptions("active_with_end").unwrap().is_empty());
}

#[test]
fn validation_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let data = dataval_core::loader::load_datasets(&cfg.inputs).unwrap();
    let pipeline = ValidationPipeline::build(cfg).unwrap();

    let (e1, v1) = pipeline.validate(&data);
    let (e2, v2) = pipeline.validate(&data);
    assert_eq!(e1, e2);
    assert_eq!(v1, v2);
}

#[test]
fn failed_table_rolls_back_every_table() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let store = ValidationStore::open(&cfg.database).unwrap();
    store.migrate().unwrap();

    let first = dataval_core::loader::load_datasets(&cfg.inputs).unwrap();
    assert!(store.replace_datasets(&first).unwrap().committed);

    // Break the last table from outside the store.
    let other = rusqlite::Connection::open(&cfg.database).unwrap();
    other.execute_batch("DROP TABLE events;").unwrap();
    drop(other);

    let mut second = first.clone();
    second.customers.truncate(1);
    second.subscriptions.clear();
    let report = store.replace_datasets(&second).unwrap();

    assert!(!report.committed);
    assert_eq!(report.status(Entity::Customers), Some(&TableLoadStatus::RolledBack));
    assert_eq!(report.status(Entity::Subscriptions), Some(&TableLoadStatus::RolledBack));
    assert!(matches!(report.status(Entity::Events), Some(TableLoadStatus::Failed { .. })));

    assert_eq!(store.row_count(Entity::Customers).unwrap(), 4);
    assert_eq!(store.row_count(Entity::Subscriptions).unwrap(), 4);
}

#[test]
fn missing_input_file_aborts_before_any_write() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(&dir);
    cfg.inputs.events = dir.path().join("nope.csv").to_string_lossy().into_owned();
    let store = ValidationStore::in_memory().unwrap();
    store.migrate().unwrap();

    let err = ValidationPipeline::build(cfg.clone()).unwrap().run(&store);
    assert!(err.is_err());
    assert!(!Path::new(&cfg.report_path).exists());
    assert_eq!(store.row_count(Entity::Customers).unwrap(), 0);
}
