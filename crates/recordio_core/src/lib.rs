//! # recordio core
//!
//! A self-framing, append-only record log.
//!
//! Records are opaque byte sequences. Each is written as one frame: a
//! 12-byte header (format marker, payload length, CRC32), the payload, and
//! zero padding up to the alignment unit (512 bytes by default). The log is
//! just frames laid end to end from offset 0; there is no index, and a
//! record's identity is its frame offset.
//!
//! This crate provides:
//! - [`FrameCodec`] - frame encoding and validation
//! - [`RecordWriter`] - appends records to a storage backend
//! - [`RecordReader`] - lazy, restartable iteration over records
//! - [`recovery`] - scanning and truncating a torn or damaged tail
//!
//! ## Recovery contract
//!
//! Iteration stops without error at the first frame that is incomplete or
//! fails validation. Truncating a log anywhere inside frame `k + 1` still
//! yields the first `k` records. Only oversized payloads and storage
//! failures are reported as [`LogError`] while reading and writing.
//!
//! A writer opened over a torn tail truncates it. A writer opened over a
//! corrupt frame fails with [`LogError::CorruptLog`] and leaves the log
//! alone; [`recovery::recover`] drops the damaged suffix explicitly.
//!
//! ## Example
//!
//! ```rust
//! use recordio_core::{RecordReader, RecordWriter};
//! use recordio_storage::InMemoryBackend;
//!
//! let mut writer = RecordWriter::new(InMemoryBackend::new()).unwrap();
//! writer.write_chunks(&[b"hello ", b"world"]).unwrap();
//! writer.write(b"goodbye").unwrap();
//!
//! let reader = RecordReader::new(writer.into_inner()).unwrap();
//! let mut it = reader.iter();
//! assert_eq!(it.next().unwrap().unwrap().payload, b"hello world");
//! assert_eq!(it.next().unwrap().unwrap().payload, b"goodbye");
//! assert!(it.next().is_none());
//! assert_eq!(it.cursor(), reader.end());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod frame;
mod reader;
pub mod recovery;
mod writer;

pub use config::LogConfig;
pub use error::{LogError, LogResult};
pub use frame::{
    CorruptionKind, Decoded, FrameCodec, FrameHeader, DEFAULT_ALIGNMENT, FRAME_MARKER,
    HEADER_SIZE, MAX_RECORD_SIZE,
};
pub use reader::{
    Corruption, CorruptionHandler, Cursor, Record, RecordIterator, RecordReader, StopReason,
};
pub use recovery::ScanReport;
pub use writer::RecordWriter;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
