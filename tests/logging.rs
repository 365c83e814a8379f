use std::fs;

use dump_tools::logging::init_logging;
use tempfile::tempdir;

#[test]
fn log_file_is_truncated_and_lines_carry_timestamp_and_level() {
    let temp_dir = tempdir().expect("temporary directory");
    let log_path = temp_dir.path().join("run.log");
    fs::write(&log_path, "stale line from the previous run\n").expect("old log written");

    let guard = init_logging(&log_path).expect("logging initialised");
    tracing::info!(records = 3, "input file read");
    drop(guard);

    let written = fs::read_to_string(&log_path).expect("log read");
    assert!(!written.contains("stale line"));

    let line = written
        .lines()
        .find(|line| line.contains("input file read"))
        .expect("event written to file");
    assert!(line.contains("INFO"));
    assert!(line.contains("records=3"));
    assert!(line.starts_with(|c: char| c.is_ascii_digit()));
    assert!(!line.contains('\u{1b}'));
}
