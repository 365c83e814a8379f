//! Core library for the dump-tools command line application.
//!
//! Two batch pipelines share the same shape: load a primary workbook and a
//! delimited dump, relate their rows by the `(lm_code, supplier_id)` composite
//! key, and write a single-sheet workbook. Readers and the writer live under
//! [`io`], the table representation in [`model`], the left-join enrichment in
//! [`enrich`], the membership check in [`check`], and the orchestration of
//! both runs under [`pipeline`].

pub mod check;
pub mod config;
pub mod enrich;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod pipeline;

pub use error::{Result, ToolError};
