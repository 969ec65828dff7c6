//! Error types for record log operations.

use crate::frame::CorruptionKind;
use thiserror::Error;

/// Result type for record log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors surfaced to callers of the writer and reader.
///
/// Torn tails and checksum failures do not surface while reading. They end
/// iteration; see [`StopReason`](crate::StopReason).
#[derive(Debug, Error)]
pub enum LogError {
    /// Payload longer than the encodable maximum. Nothing was written.
    #[error("record of {len} bytes exceeds the maximum of {max} bytes")]
    OversizedRecord {
        /// Length of the rejected payload.
        len: usize,
        /// Maximum accepted payload length.
        max: usize,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] recordio_storage::StorageError),

    /// A writer was opened over a log with a corrupt frame.
    ///
    /// The log is left untouched. Appending after the corrupt frame would
    /// make the new records unreachable; run
    /// [`recovery::recover`](crate::recovery::recover) to drop it and every
    /// frame after it.
    #[error("corrupt frame at offset {offset}: {kind}")]
    CorruptLog {
        /// Offset of the first corrupt frame.
        offset: u64,
        /// What was wrong with it.
        kind: CorruptionKind,
    },

    /// Configuration rejected by [`LogConfig::validate`](crate::LogConfig::validate).
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl LogError {
    /// Creates an oversized record error.
    pub fn oversized(len: usize, max: usize) -> Self {
        Self::OversizedRecord { len, max }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if the underlying storage failed.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
