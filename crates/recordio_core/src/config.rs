//! Log configuration.

use crate::error::{LogError, LogResult};
use crate::frame::{DEFAULT_ALIGNMENT, MAX_RECORD_SIZE};

/// Configuration shared by writers and readers of one log.
///
/// A reader must use the same `alignment` the log was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Frame alignment unit in bytes. Must be a non-zero power of two.
    pub alignment: usize,

    /// Largest payload a writer accepts and a reader trusts.
    ///
    /// Capped at [`MAX_RECORD_SIZE`] by the 32-bit length field.
    pub max_record_size: usize,

    /// Whether the writer flushes the backend after every write call.
    pub sync_on_write: bool,

    /// Whether a writer truncates a torn tail before appending.
    ///
    /// A writer opened with this set refuses a log that has a corrupt frame
    /// instead of truncating it.
    pub recover_on_open: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            max_record_size: MAX_RECORD_SIZE,
            sync_on_write: false,
            recover_on_open: true,
        }
    }
}

impl LogConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the frame alignment unit.
    #[must_use]
    pub const fn alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the maximum record size.
    #[must_use]
    pub const fn max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    /// Sets whether to flush after every write call.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether writers truncate a torn tail on open.
    #[must_use]
    pub const fn recover_on_open(mut self, value: bool) -> Self {
        self.recover_on_open = value;
        self
    }

    /// Checks that the configuration describes a usable log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if the alignment is zero or not a
    /// power of two, or if `max_record_size` exceeds [`MAX_RECORD_SIZE`].
    pub fn validate(&self) -> LogResult<()> {
        if !self.alignment.is_power_of_two() {
            return Err(LogError::invalid_config(format!(
                "alignment must be a non-zero power of two, got {}",
                self.alignment
            )));
        }
        if self.max_record_size > MAX_RECORD_SIZE {
            return Err(LogError::invalid_config(format!(
                "max_record_size {} exceeds the format limit of {MAX_RECORD_SIZE}",
                self.max_record_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LogConfig::default();
        assert_eq!(config.alignment, 512);
        assert_eq!(config.max_record_size, u32::MAX as usize);
        assert!(!config.sync_on_write);
        assert!(config.recover_on_open);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = LogConfig::new()
            .alignment(4096)
            .max_record_size(1024)
            .sync_on_write(true)
            .recover_on_open(false);

        assert_eq!(config.alignment, 4096);
        assert_eq!(config.max_record_size, 1024);
        assert!(config.sync_on_write);
        assert!(!config.recover_on_open);
    }

    #[test]
    fn rejects_bad_alignment() {
        for alignment in [0, 3, 100, 513] {
            let err = LogConfig::new().alignment(alignment).validate().unwrap_err();
            assert!(matches!(err, LogError::InvalidConfig { .. }));
        }
        assert!(LogConfig::new().alignment(1).validate().is_ok());
    }

    #[test]
    fn rejects_record_limit_above_format() {
        let config = LogConfig::new().max_record_size(usize::MAX);
        if usize::MAX > MAX_RECORD_SIZE {
            assert!(config.validate().is_err());
        }
    }
}
