//! Multi-sheet XLSX report.
//!
//! Sheet order: exploration, missing values, duplicates, then one sheet
//! per validation rule in registry order. Every sheet is written even
//! when empty. A failed rule gets a single `error` column with its cause.

use crate::{
    error::ValResult,
    executor::{RuleOutcome, ValidationReport},
    exploration::ExplorationSummary,
    table::Table,
    value::Value,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::{collections::HashSet, path::Path};

/// Excel's hard limit on sheet name length.
pub const MAX_SHEET_NAME: usize = 31;

/// Flatten exploration and validation results into report sheets.
pub fn report_sheets(
    exploration: &ExplorationSummary,
    validation: &ValidationReport,
) -> Vec<Table> {
    let mut sheets: Vec<Table> = exploration.tables().cloned().collect();
    for result in &validation.results {
        let table = match &result.outcome {
            RuleOutcome::Completed(set) => set.to_table(),
            RuleOutcome::Failed { cause } => {
                let mut t = Table::new(result.rule.clone(), &["error"]);
                t.push(vec![Value::Text(cause.clone())]);
                t
            }
        };
        sheets.push(table);
    }
    sheets
}

/// Excel-safe, unique sheet names in input order.
pub fn sheet_names(sheets: &[Table]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    sheets
        .iter()
        .map(|t| {
            let base: String = t
                .name
                .chars()
                .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
                .take(MAX_SHEET_NAME)
                .collect();
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.to_lowercase()) {
                let suffix = format!("~{n}");
                let keep = MAX_SHEET_NAME - suffix.len();
                name = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
                n += 1;
            }
            name
        })
        .collect()
}

/// Write `sheets` to `path`, creating the parent directory if needed.
pub fn write_report(path: &Path, sheets: &[Table]) -> ValResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (table, name) in sheets.iter().zip(sheet_names(sheets)) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_table(sheet, table, &header_format)?;
    }

    workbook.save(path)?;
    log::info!("Report written: {} sheets -> {}", sheets.len(), path.display());
    Ok(())
}

fn write_table(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<(), XlsxError> {
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let c = col as u16;
            match value {
                Value::Null => {}
                Value::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Value::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Value::Text(_) | Value::Timestamp(_) => {
                    sheet.write_string(r, c, value.to_string())?;
                }
            }
        }
    }
    Ok(())
}
