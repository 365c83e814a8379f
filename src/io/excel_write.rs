use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, Table};

/// Sheet name used for every written workbook.
pub const OUTPUT_SHEET: &str = "Sheet1";
/// Rows per worksheet, header included.
pub const MAX_ROWS: usize = 1_048_576;
/// Columns per worksheet.
pub const MAX_COLUMNS: usize = 16_384;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

struct DateFormats {
    date: Format,
    datetime: Format,
}

/// Writes the table to a single-sheet workbook at the given path: header row
/// first, no index column.
///
/// The workbook is serialised in memory first, so the target file is only
/// touched once every cell has been accepted.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if table.columns.len() > MAX_COLUMNS || table.len() + 1 > MAX_ROWS {
        return Err(ToolError::InvalidWorkbook(format!(
            "table of {} rows x {} columns exceeds the worksheet limit of {} rows x {MAX_COLUMNS} columns",
            table.len(),
            table.columns.len(),
            MAX_ROWS - 1,
        )));
    }

    let formats = DateFormats {
        date: Format::new().set_num_format(DATE_FORMAT),
        datetime: Format::new().set_num_format(DATETIME_FORMAT),
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, column_number(col_idx)?, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_number = row_number(row_idx + 1)?;
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_number, column_number(col_idx)?, cell, &formats)?;
        }
    }

    let buffer = workbook.save_to_buffer()?;
    fs::write(path, buffer)?;
    Ok(())
}

fn row_number(index: usize) -> Result<u32> {
    u32::try_from(index)
        .map_err(|_| ToolError::InvalidWorkbook(format!("row {index} is out of range")))
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index)
        .map_err(|_| ToolError::InvalidWorkbook(format!("column {index} is out of range")))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    formats: &DateFormats,
) -> Result<()> {
    match cell {
        CellValue::Null => {}
        CellValue::Boolean(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::Integer(value) => {
            worksheet.write_number(row, col, *value as f64)?;
        }
        CellValue::Number(value) if value.is_finite() => {
            worksheet.write_number(row, col, *value)?;
        }
        CellValue::Number(_) => {}
        CellValue::DateTime(serial) => {
            let format = if serial.fract() == 0.0 {
                &formats.date
            } else {
                &formats.datetime
            };
            worksheet.write_number_with_format(row, col, *serial, format)?;
        }
        CellValue::String(value) => {
            worksheet.write_string(row, col, value)?;
        }
    }
    Ok(())
}
