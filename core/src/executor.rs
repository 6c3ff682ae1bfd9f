//! Rule executor.
//!
//! Runs every registered rule in registration order. A rule that returns
//! an error or panics is recorded as `RuleOutcome::Failed` under its own
//! name and the batch continues. Empty exception sets are kept: they are
//! the positive confirmation that a check found nothing.

use crate::{
    exception::ExceptionSet,
    model::Datasets,
    registry::RuleRegistry,
    rule::{RuleContext, ValidationRule},
};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    Completed(ExceptionSet),
    Failed { cause: String },
}

impl RuleOutcome {
    pub fn exceptions(&self) -> Option<&ExceptionSet> {
        match self {
            RuleOutcome::Completed(set) => Some(set),
            RuleOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuleOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub rule:    String,
    pub outcome: RuleOutcome,
}

/// Ordered rule name -> outcome mapping for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub results: Vec<RuleReport>,
}

impl ValidationReport {
    pub fn get(&self, rule: &str) -> Option<&RuleOutcome> {
        self.results.iter().find(|r| r.rule == rule).map(|r| &r.outcome)
    }

    /// Exceptions of a completed rule. `None` if missing or failed.
    pub fn exceptions(&self, rule: &str) -> Option<&ExceptionSet> {
        self.get(rule).and_then(RuleOutcome::exceptions)
    }

    pub fn failed(&self) -> Vec<&RuleReport> {
        self.results.iter().filter(|r| r.outcome.is_failed()).collect()
    }

    pub fn total_exceptions(&self) -> usize {
        self.results
            .iter()
            .filter_map(|r| r.outcome.exceptions())
            .map(ExceptionSet::len)
            .sum()
    }
}

pub struct RuleExecutor<'a> {
    registry: &'a RuleRegistry,
}

impl<'a> RuleExecutor<'a> {
    pub fn new(registry: &'a RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn run(&self, data: &Datasets, ctx: &RuleContext) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in self.registry.rules() {
            let outcome = run_isolated(rule.as_ref(), data, ctx);
            match &outcome {
                RuleOutcome::Completed(set) => {
                    log::debug!("Rule {} completed: {} exception(s)", rule.name(), set.len());
                }
                RuleOutcome::Failed { cause } => {
                    log::warn!("Rule {} failed: {cause}", rule.name());
                }
            }
            report.results.push(RuleReport {
                rule: rule.name().to_string(),
                outcome,
            });
        }
        log::info!(
            "Ran {} rules: {} exception(s), {} failure(s)",
            report.results.len(),
            report.total_exceptions(),
            report.failed().len()
        );
        report
    }
}

fn run_isolated(rule: &dyn ValidationRule, data: &Datasets, ctx: &RuleContext) -> RuleOutcome {
    // Rules only borrow immutable data, so observing it after a panic is sound.
    match panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(data, ctx))) {
        Ok(Ok(set)) => RuleOutcome::Completed(set),
        Ok(Err(e)) => RuleOutcome::Failed { cause: e.to_string() },
        Err(payload) => RuleOutcome::Failed {
            cause: panic_message(payload.as_ref()),
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
