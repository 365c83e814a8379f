use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dump_tools::config::{
    CHECK_LOG_FILE, CsvOptions, DEFAULT_DUMP, DEFAULT_INPUT, DEFAULT_OUTPUT, ENRICH_LOG_FILE,
    PipelinePaths,
};
use dump_tools::pipeline::{self, RunSummary};
use dump_tools::{Result, logging};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let _guard = logging::init_logging(cli.command.log_file())?;

    match cli.command {
        Command::Enrich(args) => {
            let summary = pipeline::enrich_workbook(&args.paths(), &args.csv_options())?;
            write_summary(&args, &summary)
        }
        Command::Check(args) => {
            let summary = pipeline::check_workbook(&args.paths(), &args.csv_options())?;
            write_summary(&args, &summary)
        }
    }
}

fn write_summary(args: &PipelineArgs, summary: &RunSummary) -> Result<()> {
    match &args.summary {
        Some(path) => summary.write_json(path),
        None => Ok(()),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Enrich or check a product workbook against a supplier data dump."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy dimension, weight and packaging attributes from the dump onto the workbook.
    Enrich(PipelineArgs),
    /// Flag each workbook row with whether its key exists in the dump.
    Check(PipelineArgs),
}

impl Command {
    fn log_file(&self) -> &Path {
        match self {
            Command::Enrich(args) => args
                .log_file
                .as_deref()
                .unwrap_or(Path::new(ENRICH_LOG_FILE)),
            Command::Check(args) => args
                .log_file
                .as_deref()
                .unwrap_or(Path::new(CHECK_LOG_FILE)),
        }
    }
}

#[derive(clap::Args)]
struct PipelineArgs {
    /// Primary workbook; its first sheet must have `lm_code` and `supplier_id` columns.
    #[arg(long, env = "DUMP_TOOLS_INPUT", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Delimited dump with a header row.
    #[arg(long, env = "DUMP_TOOLS_DUMP", default_value = DEFAULT_DUMP)]
    dump: PathBuf,

    /// Workbook to write.
    #[arg(long, env = "DUMP_TOOLS_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Field delimiter of the dump.
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Run log, overwritten on every run.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Optional JSON file receiving the run summary.
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl PipelineArgs {
    fn paths(&self) -> PipelinePaths {
        PipelinePaths::new(self.input.clone(), self.dump.clone(), self.output.clone())
    }

    fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.delimiter,
        }
    }
}

fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got '{value}'")),
    }
}
