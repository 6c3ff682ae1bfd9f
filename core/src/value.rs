//! Dynamically typed cell values.
//!
//! Rules address columns by name, so every record exposes its fields as
//! `Value`s. Null never satisfies a comparison: `compare` returns
//! `Ok(None)` when either side is null, the same way a dataframe
//! comparison against NaN is false.

use crate::{
    error::{RuleError, RuleResult},
    types::Timestamp,
};
use chrono::Timelike;
use serde::Serialize;
use std::{cmp::Ordering, fmt};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Timestamp(Timestamp),
}

/// Hashable identity of a value, used for key sets and row duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Text(String),
    Number(u64),
    Bool(bool),
    Timestamp(Timestamp),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null         => "null",
            Value::Text(_)      => "text",
            Value::Number(_)    => "number",
            Value::Bool(_)      => "bool",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null         => ValueKey::Null,
            Value::Text(s)      => ValueKey::Text(s.clone()),
            // -0.0 and 0.0 are the same key
            Value::Number(n)    => ValueKey::Number(if *n == 0.0 { 0 } else { n.to_bits() }),
            Value::Bool(b)      => ValueKey::Bool(*b),
            Value::Timestamp(t) => ValueKey::Timestamp(*t),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Null-aware ordering. `column` is only used for the error message.
    pub fn compare(&self, other: &Value, column: &str) -> RuleResult<Option<Ordering>> {
        let ord = match (self, other) {
            (Value::Null, _) | (_, Value::Null) => return Ok(None),
            (Value::Number(a), Value::Number(b))       => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b))           => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b))           => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (a, b) => {
                return Err(RuleError::TypeMismatch {
                    column: column.to_string(),
                    left:   a.type_name(),
                    right:  b.type_name(),
                })
            }
        };
        Ok(ord)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(t) => {
                if t.num_seconds_from_midnight() == 0 && t.nanosecond() == 0 {
                    write!(f, "{}", t.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map(Value::Text).unwrap_or(Value::Null)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Option<bool>> for Value {
    fn from(v: Option<bool>) -> Self {
        v.map(Value::Bool).unwrap_or(Value::Null)
    }
}

impl From<Option<Timestamp>> for Value {
    fn from(v: Option<Timestamp>) -> Self {
        v.map(Value::Timestamp).unwrap_or(Value::Null)
    }
}
