//! dataval-runner: batch validation of the customer/subscription/event CSVs.
//!
//! Usage:
//!   dataval-runner --config data/validation_config.json
//!   dataval-runner --cutoff 2026-01-09 --db saas_analytics.db --report out.xlsx
//!   dataval-runner --json

use anyhow::Result;
use chrono::NaiveDate;
use dataval_core::{
    config::ValidationConfig,
    executor::RuleOutcome,
    pipeline::{RunOutcome, ValidationPipeline},
    store::{TableLoadStatus, ValidationStore},
};
use std::{env, path::Path};

const DEFAULT_CONFIG: &str = "data/validation_config.json";

#[derive(serde::Serialize)]
struct RuleSummary<'a> {
    rule:       &'a str,
    status:     &'static str,
    exceptions: usize,
    error:      Option<&'a str>,
}

#[derive(serde::Serialize)]
struct RunSummary<'a> {
    run_id:      &'a str,
    report_path: String,
    committed:   bool,
    rules:       Vec<RuleSummary<'a>>,
    stored_rows: Vec<(&'static str, i64)>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json = args.iter().any(|a| a == "--json");
    let config_path = flag(&args, "--config");

    let mut config = match config_path {
        Some(path) => ValidationConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => ValidationConfig::load(DEFAULT_CONFIG)?,
        None => ValidationConfig::default_test(),
    };
    apply_overrides(&mut config, &args)?;

    if !json {
        println!("dataval-runner");
        println!("  customers:      {}", config.inputs.customers);
        println!("  subscriptions:  {}", config.inputs.subscriptions);
        println!("  events:         {}", config.inputs.events);
        println!("  current date:   {}", config.current_date);
        println!("  report:         {}", config.report_path);
        println!("  database:       {}", config.database);
        println!();
    }

    if let Some(parent) = db_parent(&config.database) {
        std::fs::create_dir_all(parent)?;
    }
    let store = ValidationStore::open(&config.database)?;
    store.migrate()?;

    let pipeline = ValidationPipeline::build(config)?;
    let outcome = pipeline.run(&store)?;
    log::info!("Run {} finished", outcome.run_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&summarize(&outcome))?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn apply_overrides(config: &mut ValidationConfig, args: &[String]) -> Result<()> {
    if let Some(v) = flag(args, "--customers") {
        config.inputs.customers = v.to_string();
    }
    if let Some(v) = flag(args, "--subscriptions") {
        config.inputs.subscriptions = v.to_string();
    }
    if let Some(v) = flag(args, "--events") {
        config.inputs.events = v.to_string();
    }
    if let Some(v) = flag(args, "--report") {
        config.report_path = v.to_string();
    }
    if let Some(v) = flag(args, "--db") {
        config.database = v.to_string();
    }
    if let Some(v) = flag(args, "--cutoff") {
        config.current_date = NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("--cutoff {v}: {e}"))?;
    }
    Ok(())
}

fn summarize(outcome: &RunOutcome) -> RunSummary<'_> {
    let rules = outcome
        .validation
        .results
        .iter()
        .map(|r| match &r.outcome {
            RuleOutcome::Completed(set) => RuleSummary {
                rule:       &r.rule,
                status:     "completed",
                exceptions: set.len(),
                error:      None,
            },
            RuleOutcome::Failed { cause } => RuleSummary {
                rule:       &r.rule,
                status:     "failed",
                exceptions: 0,
                error:      Some(cause.as_str()),
            },
        })
        .collect();

    RunSummary {
        run_id:      &outcome.run_id,
        report_path: outcome.report_path.display().to_string(),
        committed:   outcome.persistence.committed,
        rules,
        stored_rows: outcome.stored_rows.iter().map(|(e, n)| (e.name(), *n)).collect(),
    }
}

fn print_summary(outcome: &RunOutcome) {
    println!("=== VALIDATION ===");
    for r in &outcome.validation.results {
        match &r.outcome {
            RuleOutcome::Completed(set) if set.is_empty() => {
                println!("  {:<26} ok", r.rule);
            }
            RuleOutcome::Completed(set) => {
                println!("  {:<26} {} exception(s)", r.rule, set.len());
            }
            RuleOutcome::Failed { cause } => {
                println!("  {:<26} FAILED: {cause}", r.rule);
            }
        }
    }
    println!();
    println!("Validation results saved to {}", outcome.report_path.display());

    println!();
    println!("=== PERSISTENCE ===");
    for t in &outcome.persistence.tables {
        match &t.status {
            TableLoadStatus::Loaded { rows } => {
                println!("  {} loaded successfully ({rows} rows)", t.table)
            }
            TableLoadStatus::Failed { cause } => println!("  {} error: {cause}", t.table),
            TableLoadStatus::RolledBack => println!("  {} rolled back", t.table),
            TableLoadStatus::Skipped => println!("  {} skipped", t.table),
        }
    }
    for (entity, n) in &outcome.stored_rows {
        println!("  Rows in {entity}: {n}");
    }
}

/// Directory holding a file-backed database, if any.
fn db_parent(database: &str) -> Option<&Path> {
    if database == ":memory:" || database.starts_with("file:") {
        return None;
    }
    Path::new(database).parent().filter(|p| !p.as_os_str().is_empty())
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}
