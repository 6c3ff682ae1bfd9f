//! Validation engine for the customer, subscription and event datasets.
//!
//! Load three CSV files, profile them, run a fixed catalog of integrity
//! and business-rule checks, write a multi-sheet XLSX report, and replace
//! the destination SQLite tables with the loaded rows.

pub mod config;
pub mod error;
pub mod exception;
pub mod executor;
pub mod exploration;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rules;
pub mod store;
pub mod table;
pub mod types;
pub mod value;
