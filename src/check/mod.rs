//! Membership check of primary rows against the dump's key set.

use std::collections::HashSet;

use crate::error::Result;
use crate::model::{CellValue, CompositeKey, Table};

/// Header of the appended flag column ("present in database").
pub const PRESENCE_COLUMN: &str = "есть в базе";

/// Collects the distinct composite keys of a table. Rows with a null key part
/// are skipped.
pub fn build_key_set(dump: &Table) -> Result<HashSet<CompositeKey>> {
    let keys = dump.key_columns("dump table")?;
    Ok(dump.rows.iter().filter_map(|row| keys.key_of(row)).collect())
}

/// Flags every primary row with whether its key is in `key_set`, writing the
/// result into [`PRESENCE_COLUMN`]. Returns the number of rows flagged `true`.
///
/// The column is appended, or overwritten in place if the sheet already has
/// one of that name; every other column and the row order are untouched.
pub fn flag_membership(primary: &mut Table, key_set: &HashSet<CompositeKey>) -> Result<usize> {
    let keys = primary.key_columns("primary table")?;

    let flags: Vec<bool> = primary
        .rows
        .iter()
        .map(|row| keys.key_of(row).is_some_and(|key| key_set.contains(&key)))
        .collect();

    let column = match primary.column_index(PRESENCE_COLUMN) {
        Some(existing) => existing,
        None => {
            primary.columns.push(PRESENCE_COLUMN.to_string());
            primary.columns.len() - 1
        }
    };

    for (row, flag) in primary.rows.iter_mut().zip(&flags) {
        if row.len() <= column {
            row.resize(column + 1, CellValue::Null);
        }
        row[column] = CellValue::Boolean(*flag);
    }

    Ok(flags.iter().filter(|flag| **flag).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::String(value.to_string())
    }

    fn keyed(rows: &[(&str, i64)]) -> Table {
        let mut table = Table::new(vec!["lm_code".into(), "supplier_id".into()]);
        for (code, supplier) in rows {
            table.push_row(vec![text(code), CellValue::Integer(*supplier)]);
        }
        table
    }

    #[test]
    fn duplicate_dump_keys_collapse() {
        let dump = keyed(&[("A1", 7), ("A1", 7), ("B2", 1)]);
        let set = build_key_set(&dump).expect("key set");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn flags_present_and_absent_rows() {
        let dump = keyed(&[("A1", 7), ("A1", 7)]);
        let set = build_key_set(&dump).expect("key set");
        let mut primary = keyed(&[("A1", 7), ("Z9", 3)]);

        let present = flag_membership(&mut primary, &set).expect("flagged");

        assert_eq!(present, 1);
        assert_eq!(primary.columns.len(), 3);
        assert_eq!(
            primary.cell(0, PRESENCE_COLUMN),
            Some(&CellValue::Boolean(true))
        );
        assert_eq!(
            primary.cell(1, PRESENCE_COLUMN),
            Some(&CellValue::Boolean(false))
        );
    }

    #[test]
    fn existing_flag_column_is_overwritten() {
        let mut primary = Table::new(vec![
            "lm_code".into(),
            PRESENCE_COLUMN.into(),
            "supplier_id".into(),
        ]);
        primary.push_row(vec![text("A1"), text("stale"), CellValue::Integer(7)]);
        let set = build_key_set(&keyed(&[("A1", 7)])).expect("key set");

        flag_membership(&mut primary, &set).expect("flagged");

        assert_eq!(primary.columns.len(), 3);
        assert_eq!(primary.rows[0][1], CellValue::Boolean(true));
    }
}
