//! Result files: XLSX table, case JSON and run report

use std::fs;
use std::path::{Path, PathBuf};

use rjco_core::{CaseRecord, ResultTable, RunReport};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::info;

use crate::error::OutputError;

pub const TABLE_EXTENSION: &str = "xlsx";
pub const CASE_EXTENSION: &str = "json";
pub const REPORT_EXTENSION: &str = "report.json";

/// `<base>.<extension>`, unless `base` already carries the extension
pub fn output_path(base: &str, extension: &str) -> PathBuf {
    let suffix = format!(".{}", extension);
    if base.ends_with(&suffix) {
        PathBuf::from(base)
    } else {
        PathBuf::from(format!("{}{}", base, suffix))
    }
}

/// Write the aggregated rows as a single-sheet workbook
///
/// Column A is a 0-based row index under a blank header, followed by every
/// data column, `Entidad` and `Ciudad`. Rows missing a column get an empty
/// cell.
pub fn write_table_xlsx(table: &ResultTable, path: &Path) -> Result<(), OutputError> {
    let headers = table.headers();
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, column(col + 1), header, &bold)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let line = index as u32 + 1;
        sheet.write_number(line, 0, index as f64)?;
        for (col, header) in headers.iter().enumerate() {
            if let Some(value) = row.get(header) {
                sheet.write_string(line, column(col + 1), value)?;
            }
        }
    }

    workbook.save(path)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Write a case record as pretty-printed UTF-8 JSON
pub fn write_case_json(record: &CaseRecord, path: &Path) -> Result<(), OutputError> {
    write_json(record, path)?;
    info!("Wrote case {} to {}", record.numero_radicacion, path.display());
    Ok(())
}

/// Write the per-city and per-entity outcomes of a run
pub fn write_report_json(report: &RunReport, path: &Path) -> Result<(), OutputError> {
    write_json(report, path)?;
    info!("Wrote run report to {}", path.display());
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn column(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(u16::MAX)
}
