//! The validation pipeline: one batch run end to end.
//!
//! STAGES (fixed order):
//!   1. Load      the three CSV datasets (fatal on error)
//!   2. Explore   descriptive summary sheets
//!   3. Validate  every registered rule, failures isolated per rule
//!   4. Report    one XLSX workbook (fatal on error)
//!   5. Persist   replace all three tables in one transaction
//!
//! RULES:
//!   - Datasets are loaded once and never mutated.
//!   - Stages 2 and 3 are pure; running them twice on the same input
//!     yields identical results.
//!   - The cutoff date comes from configuration, never from the clock.

use crate::{
    config::ValidationConfig,
    error::ValResult,
    executor::{RuleExecutor, ValidationReport},
    exploration::ExplorationSummary,
    loader,
    model::{Datasets, Entity},
    registry::RuleRegistry,
    report,
    rule::RuleContext,
    store::{PersistenceReport, ValidationStore},
    types::RunId,
};
use std::path::PathBuf;

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id:      RunId,
    pub exploration: ExplorationSummary,
    pub validation:  ValidationReport,
    pub report_path: PathBuf,
    pub persistence: PersistenceReport,
    /// Row counts read back from the store after persistence.
    pub stored_rows: Vec<(Entity, i64)>,
}

pub struct ValidationPipeline {
    config:   ValidationConfig,
    registry: RuleRegistry,
    ctx:      RuleContext,
}

impl ValidationPipeline {
    /// Pipeline with the standard rule catalog.
    pub fn build(config: ValidationConfig) -> ValResult<Self> {
        Ok(Self::with_registry(config, RuleRegistry::standard()?))
    }

    pub fn with_registry(config: ValidationConfig, registry: RuleRegistry) -> Self {
        let ctx = RuleContext::from_config(&config);
        Self { config, registry, ctx }
    }

    /// Stages 2 and 3 over already-loaded data.
    pub fn validate(&self, data: &Datasets) -> (ExplorationSummary, ValidationReport) {
        let exploration = ExplorationSummary::build(data);
        let validation = RuleExecutor::new(&self.registry).run(data, &self.ctx);
        (exploration, validation)
    }

    /// Full run: load, explore, validate, report, persist.
    pub fn run(&self, store: &ValidationStore) -> ValResult<RunOutcome> {
        let data = loader::load_datasets(&self.config.inputs)?;
        self.run_loaded(&data, store)
    }

    /// Stages 2 to 5 over datasets loaded elsewhere.
    pub fn run_loaded(&self, data: &Datasets, store: &ValidationStore) -> ValResult<RunOutcome> {
        let run_id = uuid::Uuid::new_v4().to_string();
        log::info!("Validation run {run_id} (cutoff {})", self.ctx.cutoff);

        let (exploration, validation) = self.validate(data);

        let report_path = PathBuf::from(&self.config.report_path);
        let sheets = report::report_sheets(&exploration, &validation);
        report::write_report(&report_path, &sheets)?;

        let started_at = chrono::Utc::now().to_rfc3339();
        store.insert_run(&run_id, self.ctx.cutoff, env!("CARGO_PKG_VERSION"), &started_at)?;
        store.record_rule_results(&run_id, &validation)?;

        let persistence = store.replace_datasets(data)?;
        let stored_rows = Entity::ALL
            .iter()
            .map(|e| store.row_count(*e).map(|n| (*e, n)))
            .collect::<ValResult<Vec<_>>>()?;

        Ok(RunOutcome {
            run_id,
            exploration,
            validation,
            report_path,
            persistence,
            stored_rows,
        })
    }
}
