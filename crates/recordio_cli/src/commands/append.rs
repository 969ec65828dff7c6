//! Append command implementation.

use super::{CliError, CliResult};
use recordio_core::{LogConfig, RecordWriter};
use recordio_storage::FileBackend;
use std::path::{Path, PathBuf};

/// Runs the append command, returning the frame offset of each new record.
///
/// Creates the log if it does not exist.
pub fn run(
    path: &Path,
    config: &LogConfig,
    inputs: &[String],
    from_files: bool,
) -> CliResult<Vec<u64>> {
    let payloads = if from_files {
        inputs
            .iter()
            .map(|input| {
                let input = PathBuf::from(input);
                std::fs::read(&input).map_err(|source| CliError::Input {
                    path: input,
                    source,
                })
            })
            .collect::<CliResult<Vec<_>>>()?
    } else {
        inputs.iter().map(|s| s.as_bytes().to_vec()).collect()
    };

    let backend = FileBackend::open_with_create_dirs(path)?;
    let mut writer = RecordWriter::with_config(backend, config.clone())?;
    let offsets = writer.write_batch(&payloads)?;
    writer.sync()?;

    for (offset, payload) in offsets.iter().zip(&payloads) {
        println!("[{offset:010}] appended {} bytes", payload.len());
    }
    Ok(offsets)
}
