//! CSV dataset loader.
//!
//! Each file must carry a header row naming every column of its entity.
//! Columns are matched by name, extra columns are ignored, and empty or
//! NA-token cells (`NaN`, `NA`, `null`, ...) load as null. Date columns
//! (`Entity::date_columns`) are parsed here so that rules only ever see
//! timestamps. Any malformed row aborts the load.

use crate::{
    config::InputPaths,
    error::{ValError, ValResult},
    model::{Customer, Datasets, Entity, Event, Subscription},
    types::Timestamp,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::{fs::File, io::Read};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Cell spellings read as missing, the same set pandas treats as NA.
const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Deserialize)]
struct CustomerRow {
    customer_id:   Option<String>,
    segment:       Option<String>,
    country:       Option<String>,
    is_enterprise: Option<String>,
    signup_date:   Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionRow {
    customer_id:   Option<String>,
    status:        Option<String>,
    monthly_price: Option<String>,
    start_date:    Option<String>,
    end_date:      Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    customer_id: Option<String>,
    event_type:  Option<String>,
    event_date:  Option<String>,
    source:      Option<String>,
}

/// Load all three datasets. The first failure aborts the run.
pub fn load_datasets(inputs: &InputPaths) -> ValResult<Datasets> {
    let customers = read_customers(open(&inputs.customers)?, &inputs.customers)?;
    log::info!("Loaded {} customers from {}", customers.len(), inputs.customers);

    let subscriptions = read_subscriptions(open(&inputs.subscriptions)?, &inputs.subscriptions)?;
    log::info!(
        "Loaded {} subscriptions from {}",
        subscriptions.len(),
        inputs.subscriptions
    );

    let events = read_events(open(&inputs.events)?, &inputs.events)?;
    log::info!("Loaded {} events from {}", events.len(), inputs.events);

    Ok(Datasets { customers, subscriptions, events })
}

fn open(path: &str) -> ValResult<File> {
    File::open(path).map_err(|e| ValError::Load {
        path:   path.to_string(),
        row:    0,
        reason: e.to_string(),
    })
}

/// Reader positioned after a header that names every column of `entity`.
fn csv_reader<R: Read>(source: R, entity: Entity, label: &str) -> ValResult<csv::Reader<R>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let header = RowCtx { label, row: 1 };
    let names = rdr.headers().map_err(|e| header.err(e.to_string()))?;
    if names.is_empty() {
        return Err(header.err("empty file, no header row".into()));
    }
    let missing: Vec<&str> = entity
        .columns()
        .iter()
        .copied()
        .filter(|c| !names.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(header.err(format!("missing column(s): {}", missing.join(", "))));
    }
    Ok(rdr)
}

/// `label` names the source in error messages.
pub fn read_customers<R: Read>(source: R, label: &str) -> ValResult<Vec<Customer>> {
    let mut rdr = csv_reader(source, Entity::Customers, label)?;
    let mut out = Vec::new();
    for (i, result) in rdr.deserialize::<CustomerRow>().enumerate() {
        let cx = RowCtx { label, row: i + 2 };
        let raw = result.map_err(|e| cx.err(e.to_string()))?;
        out.push(Customer {
            customer_id:   cx.required_id(raw.customer_id)?,
            segment:       non_empty(raw.segment),
            country:       non_empty(raw.country),
            is_enterprise: cx.bool("is_enterprise", raw.is_enterprise)?,
            signup_date:   cx.timestamp("signup_date", raw.signup_date)?,
        });
    }
    Ok(out)
}

pub fn read_subscriptions<R: Read>(source: R, label: &str) -> ValResult<Vec<Subscription>> {
    let mut rdr = csv_reader(source, Entity::Subscriptions, label)?;
    let mut out = Vec::new();
    for (i, result) in rdr.deserialize::<SubscriptionRow>().enumerate() {
        let cx = RowCtx { label, row: i + 2 };
        let raw = result.map_err(|e| cx.err(e.to_string()))?;
        out.push(Subscription {
            customer_id:   cx.required_id(raw.customer_id)?,
            status:        non_empty(raw.status),
            monthly_price: cx.number("monthly_price", raw.monthly_price)?,
            start_date:    cx.timestamp("start_date", raw.start_date)?,
            end_date:      cx.timestamp("end_date", raw.end_date)?,
        });
    }
    Ok(out)
}

pub fn read_events<R: Read>(source: R, label: &str) -> ValResult<Vec<Event>> {
    let mut rdr = csv_reader(source, Entity::Events, label)?;
    let mut out = Vec::new();
    for (i, result) in rdr.deserialize::<EventRow>().enumerate() {
        let cx = RowCtx { label, row: i + 2 };
        let raw = result.map_err(|e| cx.err(e.to_string()))?;
        out.push(Event {
            customer_id: cx.required_id(raw.customer_id)?,
            event_type:  non_empty(raw.event_type),
            event_date:  cx.timestamp("event_date", raw.event_date)?,
            source:      non_empty(raw.source),
        });
    }
    Ok(out)
}

/// Parse a date or datetime cell. Date-only values land on midnight.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !NA_TOKENS.contains(&s.trim()))
}

/// Source position of the row being converted.
struct RowCtx<'a> {
    label: &'a str,
    row:   usize,
}

impl RowCtx<'_> {
    fn err(&self, reason: String) -> ValError {
        ValError::Load {
            path: self.label.to_string(),
            row: self.row,
            reason,
        }
    }

    fn required_id(&self, v: Option<String>) -> ValResult<String> {
        non_empty(v).ok_or_else(|| self.err("customer_id is empty".into()))
    }

    fn bool(&self, column: &str, v: Option<String>) -> ValResult<Option<bool>> {
        non_empty(v)
            .map(|s| {
                parse_bool(&s).ok_or_else(|| self.err(format!("{column}: not a boolean: '{s}'")))
            })
            .transpose()
    }

    fn number(&self, column: &str, v: Option<String>) -> ValResult<Option<f64>> {
        non_empty(v)
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| self.err(format!("{column}: not a number: '{s}'")))
            })
            .transpose()
    }

    fn timestamp(&self, column: &str, v: Option<String>) -> ValResult<Option<Timestamp>> {
        non_empty(v)
            .map(|s| {
                parse_timestamp(&s).ok_or_else(|| self.err(format!("{column}: not a date: '{s}'")))
            })
            .transpose()
    }
}
