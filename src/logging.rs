use std::fs::File;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Result, ToolError};

/// Installs the global subscriber: human-readable lines on stdout and the same
/// lines, without colour codes, in `log_file`. The file is truncated first.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the duration of the run.
pub fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let file = File::create(log_file)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))?;

    Ok(guard)
}
