//! Dump command implementation.

use super::{require_existing, CliResult};
use crate::OutputFormat;
use recordio_core::{LogConfig, RecordReader, StopReason};
use recordio_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;

/// Longest payload prefix shown in a preview.
const PREVIEW_LEN: usize = 32;

/// Record representation for output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordInfo {
    /// Frame offset.
    pub offset: u64,
    /// Frame length including padding.
    pub frame_len: u64,
    /// Payload length.
    pub len: usize,
    /// Printable text, or hex when the payload is binary.
    pub preview: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    config: &LogConfig,
    start_offset: u64,
    limit: Option<usize>,
    format: OutputFormat,
) -> CliResult<()> {
    require_existing(path)?;
    let reader = RecordReader::with_config(FileBackend::open(path)?, config)?;
    let (records, stop) = collect_records(&reader, start_offset, limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => print_text_output(&records, stop.as_ref()),
    }

    Ok(())
}

/// Reads up to `limit` records starting at `start_offset`.
///
/// Also returns why the scan stopped, if it ran to the end.
pub fn collect_records<B: StorageBackend>(
    reader: &RecordReader<B>,
    start_offset: u64,
    limit: Option<usize>,
) -> CliResult<(Vec<RecordInfo>, Option<StopReason>)> {
    let max_records = limit.unwrap_or(usize::MAX);
    let mut it = reader.iter_from(start_offset);
    let mut records = Vec::new();

    while records.len() < max_records {
        let Some(result) = it.next() else { break };
        let record = result?;
        records.push(RecordInfo {
            offset: record.offset,
            frame_len: record.frame_len,
            len: record.payload.len(),
            preview: preview(&record.payload),
        });
    }

    Ok((records, it.stop_reason().copied()))
}

/// Renders a short, single-line view of a payload.
pub fn preview(payload: &[u8]) -> String {
    let head = &payload[..payload.len().min(PREVIEW_LEN)];
    let printable = head.iter().all(|b| b.is_ascii_graphic() || *b == b' ');

    let mut out = if printable {
        format!("{:?}", String::from_utf8_lossy(head))
    } else {
        head.iter().map(|b| format!("{b:02x}")).collect()
    };
    if payload.len() > PREVIEW_LEN {
        out.push_str("...");
    }
    out
}

fn print_text_output(records: &[RecordInfo], stop: Option<&StopReason>) {
    println!("Records ({} listed)", records.len());
    println!("================");
    println!();

    for record in records {
        println!(
            "[{:010}] len={:<8} frame={:<8} {}",
            record.offset, record.len, record.frame_len, record.preview
        );
    }

    match stop {
        Some(StopReason::EndOfData) | None => {}
        Some(StopReason::TornTail {
            offset, available, ..
        }) => {
            println!();
            println!("Torn frame at offset {offset} ({available} bytes present)");
        }
        Some(StopReason::Corrupt(corruption)) => {
            println!();
            println!("Stopped: {corruption}");
        }
    }
}
