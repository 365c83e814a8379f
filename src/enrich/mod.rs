//! Left-join enrichment of the primary sheet with dump attributes.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, CompositeKey, Table};

/// Dump attributes the enrichment run reports on, in processing order.
pub const ENRICH_ATTRIBUTES: [&str; 41] = [
    "unit_depth",
    "unit_height",
    "unit_width",
    "unit_net_weight",
    "unit_gross_weight",
    "unit_pack_type",
    "unit_pack_material",
    "unit_this_side_up",
    "unit_fragile",
    "unit_no_stack",
    "unit_stor_temp",
    "unit_stack_height_inc",
    "unit_pack_place_c",
    "unit_liquid",
    "unit_layer_process",
    "unit_blister_hole_d",
    "unit_blister_length_lc",
    "unit_blister_length_rc",
    "unit_blister_length_uc",
    "unit_blister_hole_c",
    "unit_adr_class",
    "unit_un_code",
    "unit_tunnel_code",
    "unit_env_hazardous",
    "unit_packaging_code",
    "inner_depth",
    "inner_width",
    "inner_height",
    "inner_gross_weight",
    "inner_nest",
    "inner_pack_type",
    "inner_pack_material",
    "outer_depth",
    "outer_width",
    "outer_height",
    "outer_gross_weight",
    "outer_nest",
    "outer_pack_type",
    "outer_pack_material",
    "pallet_layers_c",
    "pallet_boxes_in_layer",
];

/// Weight attributes stored in grams in the dump and emitted in kilograms.
pub const WEIGHT_ATTRIBUTES: [&str; 4] = [
    "unit_net_weight",
    "unit_gross_weight",
    "inner_gross_weight",
    "outer_gross_weight",
];

pub const WEIGHT_DIVISOR: f64 = 1000.0;

/// Suffix for a non-key primary column whose name also occurs in the dump.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix for the dump side of such a collision.
pub const RIGHT_SUFFIX: &str = "_y";

/// Result of [`left_join`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinResult {
    pub table: Table,
    /// Primary rows that found at least one dump row.
    pub matched_rows: usize,
    /// Primary rows kept with null dump attributes.
    pub unmatched_rows: usize,
}

/// Result of a full enrichment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichOutcome {
    pub table: Table,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    /// Named attributes absent from the joined table, in attribute order.
    pub missing_attributes: Vec<String>,
    /// Weight attributes that were rescaled.
    pub converted_attributes: Vec<String>,
}

/// Left outer join of `primary` with `dump` on `(lm_code, supplier_id)`.
///
/// Every primary row appears once per matching dump row (in dump order), or
/// once with null dump attributes when nothing matches. Output columns are the
/// primary columns followed by the non-key dump columns.
pub fn left_join(primary: &Table, dump: &Table) -> Result<JoinResult> {
    let left_keys = primary.key_columns("primary table")?;
    let right_keys = dump.key_columns("dump table")?;

    let is_left_key = |idx: usize| idx == left_keys.lm_code || idx == left_keys.supplier_id;
    let carried: Vec<usize> = (0..dump.columns.len())
        .filter(|idx| *idx != right_keys.lm_code && *idx != right_keys.supplier_id)
        .collect();

    let mut columns = Vec::with_capacity(primary.columns.len() + carried.len());
    for (idx, name) in primary.columns.iter().enumerate() {
        let collides = !is_left_key(idx) && carried.iter().any(|c| dump.columns[*c] == *name);
        columns.push(if collides {
            format!("{name}{LEFT_SUFFIX}")
        } else {
            name.clone()
        });
    }
    for idx in &carried {
        let name = &dump.columns[*idx];
        let collides = primary
            .columns
            .iter()
            .enumerate()
            .any(|(left_idx, left)| left == name && !is_left_key(left_idx));
        columns.push(if collides {
            format!("{name}{RIGHT_SUFFIX}")
        } else {
            name.clone()
        });
    }

    let mut index: HashMap<CompositeKey, Vec<usize>> = HashMap::new();
    for (row_idx, row) in dump.rows.iter().enumerate() {
        if let Some(key) = right_keys.key_of(row) {
            index.entry(key).or_default().push(row_idx);
        }
    }
    debug!(distinct_keys = index.len(), "indexed dump rows");

    let mut table = Table::new(columns);
    let mut matched_rows = 0;
    let mut unmatched_rows = 0;

    for row in &primary.rows {
        let matches = left_keys
            .key_of(row)
            .and_then(|key| index.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if matches.is_empty() {
            unmatched_rows += 1;
            let mut joined = row.clone();
            joined.resize(primary.columns.len() + carried.len(), CellValue::Null);
            table.push_row(joined);
            continue;
        }

        matched_rows += 1;
        for dump_idx in matches {
            let dump_row = &dump.rows[*dump_idx];
            let mut joined = row.clone();
            joined.extend(carried.iter().map(|idx| dump_row[*idx].clone()));
            table.push_row(joined);
        }
    }

    Ok(JoinResult {
        table,
        matched_rows,
        unmatched_rows,
    })
}

/// Joins the dump onto the primary table and rescales the weight attributes.
///
/// Each named attribute missing from the joined table is reported once with a
/// warning and left out of the output.
pub fn enrich(primary: &Table, dump: &Table) -> Result<EnrichOutcome> {
    let JoinResult {
        mut table,
        matched_rows,
        unmatched_rows,
    } = left_join(primary, dump)?;

    let mut missing_attributes = Vec::new();
    let mut converted_attributes = Vec::new();

    for attribute in ENRICH_ATTRIBUTES {
        match table.column_index(attribute) {
            None => {
                warn!(
                    attribute,
                    "column {attribute} is missing from the dump; it will not be added to the output"
                );
                missing_attributes.push(attribute.to_string());
            }
            Some(column) if WEIGHT_ATTRIBUTES.contains(&attribute) => {
                rescale_column(&mut table, column, WEIGHT_DIVISOR)?;
                converted_attributes.push(attribute.to_string());
            }
            Some(_) => {}
        }
    }

    Ok(EnrichOutcome {
        table,
        matched_rows,
        unmatched_rows,
        missing_attributes,
        converted_attributes,
    })
}

/// Divides every numeric cell of a column; nulls pass through unchanged and
/// booleans count as `0` / `1`.
fn rescale_column(table: &mut Table, column: usize, divisor: f64) -> Result<()> {
    for (row_idx, row) in table.rows.iter_mut().enumerate() {
        let cell = &row[column];
        let value = match cell {
            CellValue::Null => continue,
            CellValue::Boolean(flag) => Some(f64::from(u8::from(*flag))),
            other => other.as_f64(),
        };
        let value = value.ok_or_else(|| ToolError::Transform {
            column: table.columns[column].clone(),
            row: row_idx + 1,
            value: cell.to_string(),
        })?;
        row[column] = CellValue::Number(value / divisor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::String(value.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    #[test]
    fn duplicate_dump_keys_fan_out_in_dump_order() {
        let primary = table(
            &["lm_code", "supplier_id", "name"],
            vec![vec![text("A1"), CellValue::Integer(7), text("drill")]],
        );
        let dump = table(
            &["lm_code", "supplier_id", "unit_depth"],
            vec![
                vec![text("A1"), CellValue::Integer(7), CellValue::Integer(10)],
                vec![text("B2"), CellValue::Integer(7), CellValue::Integer(99)],
                vec![text("A1"), CellValue::Integer(7), CellValue::Integer(20)],
            ],
        );

        let joined = left_join(&primary, &dump).expect("join");
        assert_eq!(joined.table.len(), 2);
        assert_eq!(joined.matched_rows, 1);
        assert_eq!(
            joined.table.cell(0, "unit_depth"),
            Some(&CellValue::Integer(10))
        );
        assert_eq!(
            joined.table.cell(1, "unit_depth"),
            Some(&CellValue::Integer(20))
        );
        assert_eq!(joined.table.cell(1, "name"), Some(&text("drill")));
    }

    #[test]
    fn colliding_columns_get_side_suffixes() {
        let primary = table(
            &["lm_code", "supplier_id", "unit_depth"],
            vec![vec![text("A1"), CellValue::Integer(7), CellValue::Integer(1)]],
        );
        let dump = table(
            &["lm_code", "supplier_id", "unit_depth"],
            vec![vec![text("A1"), CellValue::Integer(7), CellValue::Integer(2)]],
        );

        let joined = left_join(&primary, &dump).expect("join");
        assert_eq!(
            joined.table.columns,
            vec!["lm_code", "supplier_id", "unit_depth_x", "unit_depth_y"]
        );
    }

    #[test]
    fn weight_columns_are_divided_and_others_copied() {
        let primary = table(
            &["lm_code", "supplier_id"],
            vec![
                vec![text("A1"), CellValue::Integer(7)],
                vec![text("Z9"), CellValue::Integer(3)],
            ],
        );
        let dump = table(
            &["lm_code", "supplier_id", "unit_net_weight", "unit_depth"],
            vec![vec![
                text("A1"),
                CellValue::Integer(7),
                CellValue::Integer(2500),
                CellValue::Integer(2500),
            ]],
        );

        let outcome = enrich(&primary, &dump).expect("enrich");
        assert_eq!(
            outcome.table.cell(0, "unit_net_weight"),
            Some(&CellValue::Number(2.5))
        );
        assert_eq!(
            outcome.table.cell(0, "unit_depth"),
            Some(&CellValue::Integer(2500))
        );
        assert_eq!(outcome.table.cell(1, "unit_net_weight"), Some(&CellValue::Null));
        assert_eq!(outcome.converted_attributes, vec!["unit_net_weight"]);
        assert_eq!(outcome.missing_attributes.len(), ENRICH_ATTRIBUTES.len() - 2);
        assert!(!outcome.table.has_column("unit_gross_weight"));
    }

    #[test]
    fn text_in_weight_column_is_a_transform_error() {
        let primary = table(
            &["lm_code", "supplier_id"],
            vec![vec![text("A1"), CellValue::Integer(7)]],
        );
        let dump = table(
            &["lm_code", "supplier_id", "outer_gross_weight"],
            vec![vec![text("A1"), CellValue::Integer(7), text("heavy")]],
        );

        match enrich(&primary, &dump) {
            Err(ToolError::Transform { column, row, value }) => {
                assert_eq!(column, "outer_gross_weight");
                assert_eq!(row, 1);
                assert_eq!(value, "heavy");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn boolean_weights_divide_as_zero_or_one() {
        let primary = table(
            &["lm_code", "supplier_id"],
            vec![
                vec![text("A1"), CellValue::Integer(7)],
                vec![text("B2"), CellValue::Integer(7)],
            ],
        );
        let dump = table(
            &["lm_code", "supplier_id", "inner_gross_weight"],
            vec![
                vec![text("A1"), CellValue::Integer(7), CellValue::Boolean(true)],
                vec![text("B2"), CellValue::Integer(7), CellValue::Boolean(false)],
            ],
        );

        let outcome = enrich(&primary, &dump).expect("enrich");
        assert_eq!(
            outcome.table.cell(0, "inner_gross_weight"),
            Some(&CellValue::Number(0.001))
        );
        assert_eq!(
            outcome.table.cell(1, "inner_gross_weight"),
            Some(&CellValue::Number(0.0))
        );
    }

    #[test]
    fn dump_without_keys_is_a_schema_error() {
        let primary = table(&["lm_code", "supplier_id"], Vec::new());
        let dump = table(&["lm_code", "unit_depth"], Vec::new());

        match left_join(&primary, &dump) {
            Err(ToolError::Schema { table, missing }) => {
                assert_eq!(table, "dump table");
                assert_eq!(missing, vec!["supplier_id"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
