//! Shared primitive types used across the validation engine.

use chrono::NaiveDateTime;

/// A customer key as it appears in every dataset.
pub type CustomerId = String;

/// All date columns are carried at timestamp resolution.
pub type Timestamp = NaiveDateTime;

/// The canonical validation run identifier.
pub type RunId = String;

/// Name of a rule, statistic, or report sheet.
pub type SheetName = String;
