//! Validation rule trait.
//!
//! RULE: Every check implements ValidationRule.
//! Rules are pure functions of the datasets and the context: no I/O, no
//! hidden state, and no dependence on row order except where a rule
//! groups or sorts explicitly. Registration order lives in registry.rs.

use crate::{
    config::ValidationConfig,
    error::RuleResult,
    exception::ExceptionSet,
    model::Datasets,
    types::Timestamp,
};

/// Run-wide inputs a rule may read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleContext {
    /// Upper bound for the future-date checks.
    pub cutoff: Timestamp,
}

impl RuleContext {
    pub fn new(cutoff: Timestamp) -> Self {
        Self { cutoff }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.cutoff())
    }
}

/// The contract every validation rule must fulfill.
pub trait ValidationRule: Send + Sync {
    /// Unique stable name. Also the report sheet name.
    fn name(&self) -> &str;

    fn evaluate(&self, data: &Datasets, ctx: &RuleContext) -> RuleResult<ExceptionSet>;
}
