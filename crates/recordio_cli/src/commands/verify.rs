//! Verify command implementation.

use super::{require_existing, CliError, CliResult};
use recordio_core::{recovery, LogConfig, ScanReport, StopReason};
use recordio_storage::FileBackend;
use std::path::Path;

/// Runs the verify command.
pub fn run(path: &Path, config: &LogConfig) -> CliResult<()> {
    require_existing(path)?;
    println!("Verifying log at {}", path.display());
    println!();

    let backend = FileBackend::open(path)?;
    let report = recovery::scan(&backend, config)?;
    println!("{}", describe(&report));

    println!();
    if report.is_clean() {
        println!("✓ Log verification passed");
        Ok(())
    } else {
        println!("✗ Log verification failed");
        Err(CliError::VerificationFailed(tail_summary(&report.stop)))
    }
}

/// Formats a scan report as indented lines.
pub fn describe(report: &ScanReport) -> String {
    format!(
        "  Records:        {}\n  Valid bytes:    {}\n  Total bytes:    {}\n  Trailing bytes: {}\n  Tail:           {}",
        report.records,
        report.valid_len,
        report.total_len,
        report.trailing_bytes(),
        tail_summary(&report.stop)
    )
}

fn tail_summary(stop: &StopReason) -> String {
    match stop {
        StopReason::EndOfData => "clean".to_string(),
        StopReason::TornTail {
            offset,
            needed,
            available,
        } => format!("torn frame at offset {offset} ({available} of {needed} bytes)"),
        StopReason::Corrupt(corruption) => corruption.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordio_core::RecordWriter;
    use recordio_storage::StorageBackend;
    use tempfile::tempdir;

    #[test]
    fn clean_log_passes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        writer.write(b"fine").unwrap();
        writer.sync().unwrap();

        assert!(run(&path, &LogConfig::default()).is_ok());
    }

    #[test]
    fn torn_log_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"RIO\x01partial").unwrap();

        let err = run(&path, &LogConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::VerificationFailed(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = run(&dir.path().join("absent.log"), &LogConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }

    #[test]
    fn describe_lists_counts() {
        let report = ScanReport {
            records: 2,
            valid_len: 1024,
            total_len: 1100,
            stop: StopReason::TornTail {
                offset: 1024,
                needed: 512,
                available: 76,
            },
        };
        let text = describe(&report);
        assert!(text.contains("Records:        2"));
        assert!(text.contains("Trailing bytes: 76"));
        assert!(text.contains("torn frame at offset 1024 (76 of 512 bytes)"));
    }
}
