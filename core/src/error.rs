use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot load {path} (row {row}): {reason}")]
    Load {
        path:   String,
        row:    usize,
        reason: String,
    },

    #[error("Rule '{name}' registered twice")]
    DuplicateRule { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ValResult<T> = Result<T, ValError>;

/// Failure inside a single rule evaluation.
/// The executor records these per rule; they never abort the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("{entity} has no column '{column}'")]
    UnknownColumn { entity: String, column: String },

    #[error("cannot compare {left} with {right} in column '{column}'")]
    TypeMismatch {
        column: String,
        left:   &'static str,
        right:  &'static str,
    },

    #[error("{0}")]
    Internal(String),
}

pub type RuleResult<T> = Result<T, RuleError>;
