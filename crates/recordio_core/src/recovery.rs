//! Crash recovery for record logs.
//!
//! A crash mid-append leaves a torn frame at the tail. Readers already stop
//! there, but a writer appending after the torn bytes would produce frames
//! no reader can reach. [`recover`] finds the end of the last valid frame
//! and truncates everything after it.

use crate::config::LogConfig;
use crate::error::LogResult;
use crate::frame::FrameCodec;
use crate::reader::{read_frame, Step, StopReason};
use recordio_storage::StorageBackend;
use tracing::{info, warn};

/// Summary of a full scan over a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of valid records.
    pub records: u64,
    /// Offset just past the last valid frame.
    pub valid_len: u64,
    /// Storage size when the scan started.
    pub total_len: u64,
    /// Why the scan stopped.
    pub stop: StopReason,
}

impl ScanReport {
    /// Returns true if every byte belongs to a valid frame.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stop.is_clean()
    }

    /// Bytes after the last valid frame.
    #[must_use]
    pub fn trailing_bytes(&self) -> u64 {
        self.total_len.saturating_sub(self.valid_len)
    }
}

/// Scans the whole log without modifying it.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a backend read fails.
pub fn scan<B>(backend: &B, config: &LogConfig) -> LogResult<ScanReport>
where
    B: StorageBackend + ?Sized,
{
    let codec = FrameCodec::new(config)?;
    let total_len = backend.size()?;
    let mut offset = 0u64;
    let mut records = 0u64;

    let stop = loop {
        match read_frame(backend, &codec, offset)? {
            Step::Record(record) => {
                records += 1;
                offset = record.next_offset();
            }
            Step::EndOfStream(reason) => break reason,
        }
    };

    Ok(ScanReport {
        records,
        valid_len: offset,
        total_len,
        stop,
    })
}

/// Truncates the log to its last valid frame.
///
/// Returns the report of the scan that preceded truncation. A clean log is
/// left untouched.
///
/// # Errors
///
/// Returns an error if the scan, the truncation, or the sync fails.
pub fn recover<B>(backend: &mut B, config: &LogConfig) -> LogResult<ScanReport>
where
    B: StorageBackend + ?Sized,
{
    let report = scan(&*backend, config)?;
    truncate_to_valid(backend, &report)?;
    Ok(report)
}

/// Drops everything after `report.valid_len` and syncs.
pub(crate) fn truncate_to_valid<B>(backend: &mut B, report: &ScanReport) -> LogResult<()>
where
    B: StorageBackend + ?Sized,
{
    if report.trailing_bytes() == 0 {
        return Ok(());
    }

    match &report.stop {
        StopReason::Corrupt(corruption) => warn!(
            offset = corruption.offset,
            kind = %corruption.kind,
            dropped = report.trailing_bytes(),
            "truncating log at corrupt frame"
        ),
        _ => warn!(
            offset = report.valid_len,
            dropped = report.trailing_bytes(),
            "truncating torn log tail"
        ),
    }

    backend.truncate(report.valid_len)?;
    backend.sync()?;
    info!(
        records = report.records,
        len = report.valid_len,
        "record log recovered"
    );
    Ok(())
}
