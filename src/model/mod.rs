use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, ToolError};

/// Product code half of the composite key.
pub const LM_CODE: &str = "lm_code";
/// Supplier half of the composite key.
pub const SUPPLIER_ID: &str = "supplier_id";
/// Columns every input table must carry, in the order they are reported.
pub const KEY_COLUMNS: [&str; 2] = [LM_CODE, SUPPLIER_ID];

/// Largest float that still maps onto an exact integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// A single cell of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell or recognised missing-value marker.
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    /// Spreadsheet date or date-time, kept as its serial day number.
    DateTime(f64),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(value) => Some(*value as f64),
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Canonical text used when the cell takes part in a composite key.
    ///
    /// Integral floats collapse onto their integer form so that a code stored
    /// as `7.0` in a workbook matches `7` in the dump. Null never matches.
    fn key_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Boolean(value) => Some(value.to_string()),
            CellValue::Integer(value) => Some(value.to_string()),
            CellValue::Number(value) => {
                if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT {
                    Some((*value as i64).to_string())
                } else {
                    Some(value.to_string())
                }
            }
            CellValue::DateTime(value) => Some(value.to_string()),
            CellValue::String(value) => Some(value.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Boolean(value) => write!(f, "{value}"),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Number(value) | CellValue::DateTime(value) => write!(f, "{value}"),
            CellValue::String(value) => f.write_str(value),
        }
    }
}

/// The `(lm_code, supplier_id)` pair rows are joined and looked up by.
///
/// Uniqueness is not guaranteed on either side of a join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub lm_code: String,
    pub supplier_id: String,
}

impl CompositeKey {
    pub fn new(lm_code: impl Into<String>, supplier_id: impl Into<String>) -> Self {
        Self {
            lm_code: lm_code.into(),
            supplier_id: supplier_id.into(),
        }
    }

    /// Builds a key from the two key cells; `None` when either one is null.
    pub fn from_cells(lm_code: &CellValue, supplier_id: &CellValue) -> Option<Self> {
        Some(Self {
            lm_code: lm_code.key_text()?,
            supplier_id: supplier_id.key_text()?,
        })
    }
}

/// Positions of the two key columns inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub lm_code: usize,
    pub supplier_id: usize,
}

impl KeyColumns {
    pub fn key_of(&self, row: &[CellValue]) -> Option<CompositeKey> {
        CompositeKey::from_cells(row.get(self.lm_code)?, row.get(self.supplier_id)?)
    }
}

/// An in-memory table: named columns plus rows padded to the column count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding it with nulls up to the column count.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        if row.len() < self.columns.len() {
            row.resize(self.columns.len(), CellValue::Null);
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Required columns the table lacks, in the order they were asked for.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Fails with [`ToolError::Schema`] listing every required column the
    /// table lacks. `table` names the source in the error message.
    pub fn require_columns(&self, table: &str, required: &[&str]) -> Result<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::Schema {
                table: table.to_string(),
                missing,
            })
        }
    }

    /// Resolves the key column positions, failing when either is absent.
    pub fn key_columns(&self, table: &str) -> Result<KeyColumns> {
        match (self.column_index(LM_CODE), self.column_index(SUPPLIER_ID)) {
            (Some(lm_code), Some(supplier_id)) => Ok(KeyColumns {
                lm_code,
                supplier_id,
            }),
            _ => Err(ToolError::Schema {
                table: table.to_string(),
                missing: self.missing_columns(&KEY_COLUMNS),
            }),
        }
    }

    /// Looks up a cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}

/// Normalises raw header cells: blanks become `Unnamed: <index>` and repeated
/// names get `.1`, `.2`, ... suffixes in order of appearance.
pub fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (index, name) in raw.into_iter().enumerate() {
        let name = if name.trim().is_empty() {
            format!("Unnamed: {index}")
        } else {
            name
        };

        let unique = if seen.contains(&name) {
            let mut counter = 1;
            loop {
                let candidate = format!("{name}.{counter}");
                if !seen.contains(&candidate) {
                    break candidate;
                }
                counter += 1;
            }
        } else {
            name
        };

        seen.insert(unique.clone());
        headers.push(unique);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_match_integer_keys() {
        let from_sheet =
            CompositeKey::from_cells(&CellValue::String("A1".into()), &CellValue::Number(7.0));
        let from_dump =
            CompositeKey::from_cells(&CellValue::String("A1".into()), &CellValue::Integer(7));
        assert_eq!(from_sheet, from_dump);
        assert_eq!(from_sheet, Some(CompositeKey::new("A1", "7")));
    }

    #[test]
    fn text_and_numeric_codes_share_a_key() {
        let text_code = CompositeKey::from_cells(
            &CellValue::String("1001".into()),
            &CellValue::String("7".into()),
        );
        let numeric_code =
            CompositeKey::from_cells(&CellValue::Integer(1001), &CellValue::Integer(7));
        assert_eq!(text_code, numeric_code);
    }

    #[test]
    fn null_key_part_yields_no_key() {
        assert_eq!(
            CompositeKey::from_cells(&CellValue::Null, &CellValue::Integer(3)),
            None
        );
    }

    #[test]
    fn require_columns_reports_every_missing_key() {
        let table = Table::new(vec!["name".into()]);
        match table.require_columns("input.xlsx", &KEY_COLUMNS) {
            Err(ToolError::Schema { table, missing }) => {
                assert_eq!(table, "input.xlsx");
                assert_eq!(missing, vec!["lm_code", "supplier_id"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn headers_are_deduplicated_and_blanks_named() {
        let headers = unique_headers(vec![
            "a".into(),
            "".into(),
            "a".into(),
            "a".into(),
        ]);
        assert_eq!(headers, vec!["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![CellValue::Integer(1)]);
        assert_eq!(table.rows[0], vec![CellValue::Integer(1), CellValue::Null]);
    }
}
