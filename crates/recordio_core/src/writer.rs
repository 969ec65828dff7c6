//! Record writer.

use crate::config::LogConfig;
use crate::error::{LogError, LogResult};
use crate::frame::FrameCodec;
use crate::reader::StopReason;
use crate::recovery;
use recordio_storage::StorageBackend;
use tracing::{debug, warn};

/// Appends records to a storage backend.
///
/// Every write call encodes complete frames in memory and hands them to the
/// backend in one `append`, so a failed call leaves at most one torn frame
/// at the tail, which readers treat as end of log.
///
/// The writer does not flush unless [`LogConfig::sync_on_write`] is set;
/// call [`RecordWriter::flush`] or [`RecordWriter::sync`] at the durability
/// points you need.
///
/// # Example
///
/// ```rust
/// use recordio_core::{RecordReader, RecordWriter};
/// use recordio_storage::InMemoryBackend;
///
/// let mut writer = RecordWriter::new(InMemoryBackend::new()).unwrap();
/// let first = writer.write(b"hello ").unwrap();
/// let second = writer.write(b"world").unwrap();
/// assert!(second > first);
///
/// let reader = RecordReader::new(writer.into_inner()).unwrap();
/// let payloads: Vec<_> = reader.iter().map(|r| r.unwrap().payload).collect();
/// assert_eq!(payloads, vec![b"hello ".to_vec(), b"world".to_vec()]);
/// ```
pub struct RecordWriter<B: StorageBackend> {
    backend: B,
    codec: FrameCodec,
    sync_on_write: bool,
}

impl<B: StorageBackend> RecordWriter<B> {
    /// Opens a writer with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing log has a corrupt frame, or if
    /// recovering a torn tail fails.
    pub fn new(backend: B) -> LogResult<Self> {
        Self::with_config(backend, LogConfig::default())
    }

    /// Opens a writer over `backend`, appending after its current contents.
    ///
    /// The existing log is scanned first. With
    /// [`LogConfig::recover_on_open`] set, a torn frame at the tail is
    /// truncated. A corrupt frame is never truncated here.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::CorruptLog`] if `recover_on_open` is set and the
    /// log contains a corrupt frame; the log is left untouched. Also returns
    /// an error if the configuration is invalid or the backend fails while
    /// scanning or truncating.
    pub fn with_config(mut backend: B, config: LogConfig) -> LogResult<Self> {
        let codec = FrameCodec::new(&config)?;
        let report = recovery::scan(&backend, &config)?;

        if config.recover_on_open {
            match report.stop {
                StopReason::EndOfData => {}
                StopReason::TornTail { .. } => {
                    recovery::truncate_to_valid(&mut backend, &report)?;
                }
                StopReason::Corrupt(corruption) => {
                    return Err(LogError::CorruptLog {
                        offset: corruption.offset,
                        kind: corruption.kind,
                    });
                }
            }
        } else if !report.is_clean() {
            warn!(
                valid_len = report.valid_len,
                trailing = report.trailing_bytes(),
                "log has unreadable trailing bytes; new records will be unreachable"
            );
        }

        Ok(Self {
            backend,
            codec,
            sync_on_write: config.sync_on_write,
        })
    }

    /// Writes one record and returns the offset of its frame.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::OversizedRecord`](crate::LogError::OversizedRecord)
    /// before touching storage if the payload is too long, or a storage
    /// error if the append fails.
    pub fn write(&mut self, payload: &[u8]) -> LogResult<u64> {
        self.write_chunks(&[payload])
    }

    /// Writes one record whose payload is the concatenation of `chunks`.
    ///
    /// # Errors
    ///
    /// Same as [`RecordWriter::write`].
    pub fn write_chunks(&mut self, chunks: &[&[u8]]) -> LogResult<u64> {
        let frame = self.codec.encode_chunks(chunks)?;
        self.append_frames(&frame)
    }

    /// Writes one record per payload with a single append.
    ///
    /// Returns the frame offset of each record, in order. All payloads are
    /// size-checked before anything is written.
    ///
    /// # Errors
    ///
    /// Same as [`RecordWriter::write`].
    pub fn write_batch<I, P>(&mut self, payloads: I) -> LogResult<Vec<u64>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let payloads: Vec<P> = payloads.into_iter().collect();
        if payloads.is_empty() {
            return Ok(Vec::new());
        }

        let mut total = 0usize;
        for payload in &payloads {
            let len = self.codec.checked_payload_len(&[payload.as_ref()])?;
            total = self
                .codec
                .frame_len(len)
                .and_then(|frame_len| total.checked_add(frame_len))
                .ok_or_else(|| LogError::oversized(len, self.codec.max_record_size()))?;
        }

        let mut buf = Vec::with_capacity(total);
        let mut relative = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            let payload = payload.as_ref();
            relative.push(buf.len() as u64);
            self.codec.encode_into(&mut buf, &[payload], payload.len());
        }

        let base = self.append_frames(&buf)?;
        debug!(records = payloads.len(), bytes = buf.len(), base, "wrote record batch");
        Ok(relative.into_iter().map(|rel| base + rel).collect())
    }

    fn append_frames(&mut self, frames: &[u8]) -> LogResult<u64> {
        let offset = self.backend.append(frames)?;
        if self.sync_on_write {
            self.backend.flush()?;
        }
        Ok(offset)
    }

    /// Flushes appended frames to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend flush fails.
    pub fn flush(&mut self) -> LogResult<()> {
        self.backend.flush()?;
        Ok(())
    }

    /// Syncs appended frames and file metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend sync fails.
    pub fn sync(&mut self) -> LogResult<()> {
        self.backend.sync()?;
        Ok(())
    }

    /// Returns the offset the next frame will be written at.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub fn position(&self) -> LogResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Returns the codec used for encoding.
    #[must_use]
    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    /// Returns a reference to the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the writer and returns the backend without flushing.
    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl<B: StorageBackend> std::fmt::Debug for RecordWriter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordWriter")
            .field("codec", &self.codec)
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}
