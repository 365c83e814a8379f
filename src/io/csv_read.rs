use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::config::CsvOptions;
use crate::error::{Result, ToolError};
use crate::model::{CellValue, Table, unique_headers};

/// Cell texts read as missing values, matching the markers spreadsheet
/// tooling conventionally treats as "not available".
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads the whole dump into a [`Table`].
pub fn read_table(path: &Path, options: &CsvOptions) -> Result<Table> {
    read_selected(path, options, None)
}

/// Reads only the named columns of the dump, keeping the file's column order.
/// Fails with [`ToolError::Schema`] when any of them is missing.
pub fn read_columns(path: &Path, options: &CsvOptions, wanted: &[&str]) -> Result<Table> {
    read_selected(path, options, Some(wanted))
}

fn read_selected(path: &Path, options: &CsvOptions, wanted: Option<&[&str]>) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = unique_headers(reader.headers()?.iter().map(str::to_string).collect());
    let width = headers.len();

    let selected: Vec<usize> = match wanted {
        Some(names) => {
            let missing: Vec<String> = names
                .iter()
                .filter(|name| !headers.iter().any(|header| header == *name))
                .map(|name| name.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ToolError::Schema {
                    table: path.display().to_string(),
                    missing,
                });
            }
            (0..width)
                .filter(|idx| names.contains(&headers[*idx].as_str()))
                .collect()
        }
        None => (0..width).collect(),
    };

    let columns = selected.iter().map(|idx| headers[*idx].clone()).collect();
    let mut table = Table::new(columns);

    for record in reader.records() {
        let record = record?;
        check_width(&record, width)?;
        table.push_row(
            selected
                .iter()
                .map(|idx| record.get(*idx).map(parse_cell).unwrap_or(CellValue::Null))
                .collect(),
        );
    }

    Ok(table)
}

fn check_width(record: &StringRecord, width: usize) -> Result<()> {
    if record.len() <= width {
        return Ok(());
    }
    let line = record.position().map(|position| position.line()).unwrap_or(0);
    Err(ToolError::InvalidWorkbook(format!(
        "line {line}: expected {width} fields, saw {}",
        record.len()
    )))
}

/// Infers the type of a single dump cell.
pub fn parse_cell(raw: &str) -> CellValue {
    if NA_MARKERS.contains(&raw) {
        return CellValue::Null;
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return CellValue::Integer(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return CellValue::Number(value);
    }

    match trimmed {
        "True" | "TRUE" | "true" => CellValue::Boolean(true),
        "False" | "FALSE" | "false" => CellValue::Boolean(false),
        _ => CellValue::String(raw.to_string()),
    }
}
