use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info, instrument};

use crate::check::{self, PRESENCE_COLUMN};
use crate::config::{CsvOptions, PipelinePaths};
use crate::enrich;
use crate::error::{Result, ToolError};
use crate::io::{csv_read, excel_read, excel_write};
use crate::model::{KEY_COLUMNS, Table};

/// Which of the two pipelines produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    Enrich,
    Check,
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pipeline: Pipeline,
    pub input_rows: usize,
    pub dump_rows: usize,
    pub output_rows: usize,
    /// Enrich: primary rows with at least one dump match. Check: rows flagged present.
    pub matched_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_keys: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_attributes: Vec<String>,
}

impl RunSummary {
    /// Writes the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Copies the dump's dimension, weight and packaging attributes onto the
/// primary workbook and writes the enriched sheet.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %paths.input.display(), dump = %paths.dump.display(), output = %paths.output.display())
)]
pub fn enrich_workbook(paths: &PipelinePaths, options: &CsvOptions) -> Result<RunSummary> {
    info!("starting data processing");
    check_inputs(paths)?;

    info!(path = %paths.input.display(), "loading Excel file");
    let primary = at_stage("load input", &paths.input, load_primary(&paths.input))?;
    info!(records = primary.len(), "input workbook loaded");

    info!(path = %paths.dump.display(), "loading dump CSV file");
    let dump = at_stage(
        "load dump",
        &paths.dump,
        csv_read::read_table(&paths.dump, options).and_then(|table| {
            table.require_columns(&paths.dump.display().to_string(), &KEY_COLUMNS)?;
            Ok(table)
        }),
    )?;
    info!(records = dump.len(), "dump loaded");

    info!("matching rows on 'lm_code' and 'supplier_id'");
    let outcome = at_stage("enrich", &paths.dump, enrich::enrich(&primary, &dump))?;
    info!(
        matched = outcome.matched_rows,
        unmatched = outcome.unmatched_rows,
        output_rows = outcome.table.len(),
        "join complete"
    );

    info!(path = %paths.output.display(), "saving updated file");
    at_stage(
        "write",
        &paths.output,
        excel_write::write_table(&paths.output, &outcome.table),
    )?;
    info!("data processing completed successfully");

    Ok(RunSummary {
        pipeline: Pipeline::Enrich,
        input_rows: primary.len(),
        dump_rows: dump.len(),
        output_rows: outcome.table.len(),
        matched_rows: outcome.matched_rows,
        unique_keys: None,
        missing_attributes: outcome.missing_attributes,
    })
}

/// Flags each primary row with whether its composite key occurs in the dump
/// and writes the annotated sheet.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %paths.input.display(), dump = %paths.dump.display(), output = %paths.output.display())
)]
pub fn check_workbook(paths: &PipelinePaths, options: &CsvOptions) -> Result<RunSummary> {
    info!("starting data processing");
    check_inputs(paths)?;

    info!(path = %paths.input.display(), "reading input file");
    let mut primary = at_stage("load input", &paths.input, load_primary(&paths.input))?;
    let input_rows = primary.len();
    info!(records = input_rows, "input file read");

    info!(path = %paths.dump.display(), "reading dump file");
    let dump = at_stage(
        "load dump",
        &paths.dump,
        csv_read::read_columns(&paths.dump, options, &KEY_COLUMNS),
    )?;
    let dump_rows = dump.len();
    info!(records = dump_rows, "dump file read");

    info!("building key set from dump");
    let key_set = at_stage("match", &paths.dump, check::build_key_set(&dump))?;
    info!(unique_pairs = key_set.len(), "key set built");
    drop(dump);

    info!("comparing rows");
    let present = at_stage(
        "match",
        &paths.input,
        check::flag_membership(&mut primary, &key_set),
    )?;
    info!(present, absent = input_rows - present, column = PRESENCE_COLUMN, "comparison finished");

    info!(path = %paths.output.display(), "saving results");
    at_stage(
        "write",
        &paths.output,
        excel_write::write_table(&paths.output, &primary),
    )?;
    info!("results saved");
    info!("data processing finished");

    Ok(RunSummary {
        pipeline: Pipeline::Check,
        input_rows,
        dump_rows,
        output_rows: primary.len(),
        matched_rows: present,
        unique_keys: Some(key_set.len()),
        missing_attributes: Vec::new(),
    })
}

fn load_primary(path: &Path) -> Result<Table> {
    let table = excel_read::read_table(path)?;
    table.require_columns(&path.display().to_string(), &KEY_COLUMNS)?;
    Ok(table)
}

/// Rejects a run whose workbook or dump is absent, logging the missing file.
fn check_inputs(paths: &PipelinePaths) -> Result<()> {
    paths.ensure_inputs_exist().inspect_err(|err| {
        let path = match err {
            ToolError::MissingInput(missing) => missing.as_path(),
            _ => paths.input.as_path(),
        };
        error!(stage = "load", path = %path.display(), kind = ?err.kind(), "{err}");
    })
}

/// Logs a failed stage with the file it was working on before handing the
/// error back to the caller.
fn at_stage<T>(stage: &str, path: &Path, result: Result<T>) -> Result<T> {
    result.inspect_err(|err| {
        error!(stage, path = %path.display(), kind = ?err.kind(), "{err}");
    })
}
