//! Recover command implementation.

use super::{require_existing, CliResult};
use recordio_core::{recovery, LogConfig, ScanReport};
use recordio_storage::FileBackend;
use std::path::Path;
use tracing::info;

/// Runs the recover command.
pub fn run(path: &Path, config: &LogConfig, dry_run: bool) -> CliResult<ScanReport> {
    require_existing(path)?;
    let mut backend = FileBackend::open(path)?;

    let report = if dry_run {
        recovery::scan(&backend, config)?
    } else {
        recovery::recover(&mut backend, config)?
    };

    if report.trailing_bytes() == 0 {
        println!("Log is clean: {} records, {} bytes", report.records, report.valid_len);
    } else if dry_run {
        println!(
            "Would truncate {} trailing bytes, keeping {} records ({} bytes)",
            report.trailing_bytes(),
            report.records,
            report.valid_len
        );
    } else {
        info!(path = %path.display(), "log truncated");
        println!(
            "Truncated {} trailing bytes, kept {} records ({} bytes)",
            report.trailing_bytes(),
            report.records,
            report.valid_len
        );
    }

    Ok(report)
}
