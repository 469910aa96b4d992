//! Span writer configuration.

use crate::error::{StreamError, StreamResult};
use crate::naming::SegmentNaming;

/// Configuration for a [`crate::SpanWriter`] and its file segments.
#[derive(Debug, Clone)]
pub struct SpanConfig {
    /// Maximum number of bytes a single segment may hold.
    pub max_segment_bytes: u64,

    /// How segment identifiers are derived from sequence numbers.
    pub naming: SegmentNaming,

    /// Whether file segments create missing parent directories.
    pub create_dirs: bool,

    /// Whether file segments are synced to disk when closed.
    pub sync_on_close: bool,
}

impl Default for SpanConfig {
    fn default() -> Self {
        Self {
            max_segment_bytes: 64 * 1024 * 1024, // 64 MB
            naming: SegmentNaming::default(),
            create_dirs: true,
            sync_on_close: true,
        }
    }
}

impl SpanConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum segment size.
    #[must_use]
    pub const fn max_segment_bytes(mut self, size: u64) -> Self {
        self.max_segment_bytes = size;
        self
    }

    /// Sets the segment naming scheme.
    #[must_use]
    pub fn naming(mut self, naming: SegmentNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Sets whether to create missing directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets whether to sync segments on close.
    #[must_use]
    pub const fn sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if the segment size is zero.
    pub fn validate(&self) -> StreamResult<()> {
        if self.max_segment_bytes == 0 {
            return Err(StreamError::invalid_config(
                "max segment bytes must be greater than zero",
            ));
        }
        Ok(())
    }
}
