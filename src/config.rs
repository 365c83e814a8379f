//! Run configuration shared by both pipelines.

use std::path::PathBuf;

use crate::error::{Result, ToolError};

/// Historical name of the primary workbook.
pub const DEFAULT_INPUT: &str = "input_data.xlsx";
/// Historical name of the delimited dump.
pub const DEFAULT_DUMP: &str = "dump_data.csv";
/// Historical name of the produced workbook.
pub const DEFAULT_OUTPUT: &str = "output_data.xlsx";
/// Run log written by the enrichment pipeline.
pub const ENRICH_LOG_FILE: &str = "add_dimensions_to_excel.log";
/// Run log written by the membership check pipeline.
pub const CHECK_LOG_FILE: &str = "process_data.log";

/// The three files a pipeline run touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub input: PathBuf,
    pub dump: PathBuf,
    pub output: PathBuf,
}

impl PipelinePaths {
    pub fn new(
        input: impl Into<PathBuf>,
        dump: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            dump: dump.into(),
            output: output.into(),
        }
    }

    /// Fails fast when either input file does not exist.
    pub fn ensure_inputs_exist(&self) -> Result<()> {
        for path in [&self.input, &self.dump] {
            if !path.exists() {
                return Err(ToolError::MissingInput(path.clone()));
            }
        }
        Ok(())
    }
}

/// Options for reading the delimited dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

