use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, Table, unique_headers};

/// Reads the first worksheet of an Excel workbook into a [`Table`]. The first
/// row of the used range is the header row.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            ToolError::InvalidWorkbook(format!("'{}' contains no worksheets", path.display()))
        })?
        .map_err(ToolError::from)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(unique_headers(headers));
    for row in rows {
        table.push_row(row.iter().map(cell_to_value).collect());
    }

    Ok(table)
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Int(value) => CellValue::Integer(*value),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::DateTime(value) => CellValue::DateTime(*value),
        DataType::String(value) if value.is_empty() => CellValue::Null,
        DataType::String(value) => CellValue::String(value.clone()),
        DataType::Empty | DataType::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
