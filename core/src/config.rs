use crate::types::Timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Locations of the three source CSV files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputPaths {
    pub customers:     String,
    pub subscriptions: String,
    pub events:        String,
}

/// Everything a validation run needs from the outside world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// "Today" for the future-date checks. Dates strictly after
    /// midnight of this day are flagged.
    pub current_date: NaiveDate,
    pub inputs:       InputPaths,
    pub report_path:  String,
    /// SQLite path or `file:` URI for the destination tables.
    pub database:     String,
}

impl ValidationConfig {
    /// Load from a JSON config file.
    /// In tests, use ValidationConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ValidationConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Defaults matching the layout of `data/`.
    pub fn default_test() -> Self {
        Self {
            current_date: NaiveDate::from_ymd_opt(2026, 1, 9).expect("valid date"),
            inputs: InputPaths {
                customers:     "data/customers.csv".into(),
                subscriptions: "data/subscriptions.csv".into(),
                events:        "data/events.csv".into(),
            },
            report_path: "outputs/validation_results.xlsx".into(),
            database:    ":memory:".into(),
        }
    }

    pub fn cutoff(&self) -> Timestamp {
        self.current_date.and_time(chrono::NaiveTime::MIN)
    }
}
