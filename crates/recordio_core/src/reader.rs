//! Record reader and lazy iterator.
//!
//! The iterator's only state is the current offset. At each step the frame
//! at that offset is decoded:
//!
//! - a well-formed frame is yielded and the offset advances by its length,
//! - fewer bytes than the frame needs (a torn tail) ends the iteration,
//! - a frame that fails validation ends the iteration.
//!
//! Neither of the last two is an error. The format has no resynchronisation
//! marker, so nothing after a bad frame can be trusted; a crash mid-append
//! and bit rot look the same to a reader. Use
//! [`RecordIterator::stop_reason`] or [`RecordReader::on_corruption`] to tell
//! them apart. Only storage I/O failures surface as `Err`.

use crate::config::LogConfig;
use crate::error::LogResult;
use crate::frame::{CorruptionKind, Decoded, FrameCodec, HEADER_SIZE};
use recordio_storage::StorageBackend;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A record read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Offset of the record's frame.
    pub offset: u64,
    /// Total frame length; the next frame starts at `offset + frame_len`.
    pub frame_len: u64,
    /// The record payload.
    pub payload: Vec<u8>,
}

impl Record {
    /// Returns the offset of the frame that follows this one.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.offset + self.frame_len
    }
}

/// A frame that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corruption {
    /// Offset of the bad frame.
    pub offset: u64,
    /// What was wrong with it.
    pub kind: CorruptionKind,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corrupt frame at offset {}: {}", self.offset, self.kind)
    }
}

/// Why a scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last frame ended exactly at the end of storage.
    EndOfData,
    /// The bytes at `offset` are fewer than the frame there needs.
    TornTail {
        /// Offset of the incomplete frame.
        offset: u64,
        /// Bytes the frame (or its header) needs.
        needed: usize,
        /// Bytes present.
        available: usize,
    },
    /// The frame at the given offset failed validation.
    Corrupt(Corruption),
}

impl StopReason {
    /// Returns true for a scan that consumed every byte of storage.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::EndOfData)
    }
}

/// Position of an iterator, comparable with [`RecordReader::end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cursor {
    /// The next step decodes the frame at this offset.
    At(u64),
    /// The iteration has finished.
    End,
}

/// Callback invoked when a scan stops on a corrupt frame.
pub type CorruptionHandler = Arc<dyn Fn(&Corruption) + Send + Sync>;

/// Result of one iteration step.
pub(crate) enum Step {
    Record(Record),
    EndOfStream(StopReason),
}

/// Decodes the frame at `offset`.
pub(crate) fn read_frame<B>(backend: &B, codec: &FrameCodec, offset: u64) -> LogResult<Step>
where
    B: StorageBackend + ?Sized,
{
    let header = backend.read_available(offset, HEADER_SIZE)?;
    if header.is_empty() {
        return Ok(Step::EndOfStream(StopReason::EndOfData));
    }

    let needed = match codec.decode(&header) {
        Decoded::Frame { payload, consumed } => {
            return Ok(Step::Record(Record {
                offset,
                frame_len: consumed as u64,
                payload: payload.to_vec(),
            }));
        }
        Decoded::Incomplete { needed, available } if available < HEADER_SIZE => {
            return Ok(Step::EndOfStream(StopReason::TornTail {
                offset,
                needed,
                available,
            }));
        }
        Decoded::Incomplete { needed, .. } => needed,
        Decoded::Corrupt(kind) => {
            return Ok(Step::EndOfStream(StopReason::Corrupt(Corruption {
                offset,
                kind,
            })));
        }
    };

    let frame = backend.read_available(offset, needed)?;
    let step = match codec.decode(&frame) {
        Decoded::Frame { payload, consumed } => Step::Record(Record {
            offset,
            frame_len: consumed as u64,
            payload: payload.to_vec(),
        }),
        Decoded::Incomplete { needed, available } => Step::EndOfStream(StopReason::TornTail {
            offset,
            needed,
            available,
        }),
        Decoded::Corrupt(kind) => {
            Step::EndOfStream(StopReason::Corrupt(Corruption { offset, kind }))
        }
    };
    Ok(step)
}

/// Reads records from a storage backend.
///
/// The reader holds no scan state; every call to [`RecordReader::iter`]
/// starts an independent pass from offset 0, and passes over unchanged
/// storage yield identical sequences.
///
/// # Example
///
/// ```rust
/// use recordio_core::{Cursor, RecordReader, RecordWriter};
/// use recordio_storage::InMemoryBackend;
///
/// let mut writer = RecordWriter::new(InMemoryBackend::new()).unwrap();
/// writer.write(b"goodbye").unwrap();
///
/// let reader = RecordReader::new(writer.into_inner()).unwrap();
/// let mut it = reader.iter();
/// assert_eq!(it.cursor(), Cursor::At(0));
/// assert_eq!(it.next().unwrap().unwrap().payload, b"goodbye");
/// assert!(it.next().is_none());
/// assert_eq!(it.cursor(), reader.end());
/// ```
pub struct RecordReader<B: StorageBackend> {
    backend: B,
    codec: FrameCodec,
    on_corruption: Option<CorruptionHandler>,
}

impl<B: StorageBackend> RecordReader<B> {
    /// Creates a reader with the default configuration.
    ///
    /// # Errors
    ///
    /// Never fails with the default configuration.
    pub fn new(backend: B) -> LogResult<Self> {
        Self::with_config(backend, &LogConfig::default())
    }

    /// Creates a reader for a log written with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`](crate::LogError::InvalidConfig)
    /// if the configuration is invalid.
    pub fn with_config(backend: B, config: &LogConfig) -> LogResult<Self> {
        Ok(Self {
            backend,
            codec: FrameCodec::new(config)?,
            on_corruption: None,
        })
    }

    /// Registers a callback invoked whenever a scan stops on a corrupt frame.
    ///
    /// Iteration still ends at the corrupt frame.
    #[must_use]
    pub fn on_corruption<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Corruption) + Send + Sync + 'static,
    {
        self.on_corruption = Some(Arc::new(handler));
        self
    }

    /// Returns an iterator over all records from the start of the log.
    #[must_use]
    pub fn iter(&self) -> RecordIterator<'_, B> {
        self.iter_from(0)
    }

    /// Returns an iterator starting at `offset`.
    ///
    /// `offset` must be a frame offset returned by a writer or a previous
    /// iteration. Any other offset almost always decodes as corrupt and ends
    /// the iteration immediately.
    #[must_use]
    pub fn iter_from(&self, offset: u64) -> RecordIterator<'_, B> {
        RecordIterator {
            reader: self,
            offset,
            stop: None,
            finished: false,
        }
    }

    /// Reads the single record whose frame starts at `offset`.
    ///
    /// Returns `Ok(None)` if there is no complete, valid frame there.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    pub fn read_at(&self, offset: u64) -> LogResult<Option<Record>> {
        match read_frame(&self.backend, &self.codec, offset)? {
            Step::Record(record) => Ok(Some(record)),
            Step::EndOfStream(_) => Ok(None),
        }
    }

    /// The sentinel every iterator's [`RecordIterator::cursor`] reaches
    /// once it has finished.
    #[must_use]
    pub const fn end(&self) -> Cursor {
        Cursor::End
    }

    /// Returns the codec used for decoding.
    #[must_use]
    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    /// Returns a reference to the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the reader and returns the backend.
    pub fn into_inner(self) -> B {
        self.backend
    }

    fn report(&self, reason: &StopReason) {
        match reason {
            StopReason::EndOfData => {}
            StopReason::TornTail {
                offset,
                needed,
                available,
            } => {
                debug!(offset, needed, available, "record log ends in a torn frame");
            }
            StopReason::Corrupt(corruption) => {
                warn!(
                    offset = corruption.offset,
                    kind = %corruption.kind,
                    "stopping at corrupt frame"
                );
                if let Some(handler) = &self.on_corruption {
                    handler(corruption);
                }
            }
        }
    }
}

impl<B: StorageBackend> fmt::Debug for RecordReader<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordReader")
            .field("codec", &self.codec)
            .field("on_corruption", &self.on_corruption.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, B: StorageBackend> IntoIterator for &'a RecordReader<B> {
    type Item = LogResult<Record>;
    type IntoIter = RecordIterator<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A forward-only lazy iterator over records.
///
/// Yields `Ok(Record)` for each valid frame. Ends with `None` at end of
/// data, at a torn tail, or at a corrupt frame; yields a single `Err` and
/// then ends if storage fails.
pub struct RecordIterator<'a, B: StorageBackend> {
    reader: &'a RecordReader<B>,
    offset: u64,
    stop: Option<StopReason>,
    finished: bool,
}

impl<B: StorageBackend> RecordIterator<'_, B> {
    /// Returns the current position, [`Cursor::End`] once finished.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        if self.finished {
            Cursor::End
        } else {
            Cursor::At(self.offset)
        }
    }

    /// Returns why the iteration stopped.
    ///
    /// `None` while the iterator is live, or if it ended on a storage error.
    #[must_use]
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop.as_ref()
    }
}

impl<B: StorageBackend> Iterator for RecordIterator<'_, B> {
    type Item = LogResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match read_frame(&self.reader.backend, &self.reader.codec, self.offset) {
            Ok(Step::Record(record)) => {
                self.offset = record.next_offset();
                Some(Ok(record))
            }
            Ok(Step::EndOfStream(reason)) => {
                self.finished = true;
                self.reader.report(&reason);
                self.stop = Some(reason);
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<B: StorageBackend> std::iter::FusedIterator for RecordIterator<'_, B> {}
