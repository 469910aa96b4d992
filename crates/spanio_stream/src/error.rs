//! Error types for stream operations.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Discriminant of a [`StreamError`], for comparisons that must survive wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`StreamError::Io`].
    Io,
    /// See [`StreamError::AlreadyClosed`].
    AlreadyClosed,
    /// See [`StreamError::TooLargeWrite`].
    TooLargeWrite,
    /// See [`StreamError::QuotaExceeded`].
    QuotaExceeded,
    /// See [`StreamError::QuotaClose`].
    QuotaClose,
    /// See [`StreamError::SegmentClose`].
    SegmentClose,
    /// See [`StreamError::SegmentCreate`].
    SegmentCreate,
    /// See [`StreamError::PartialWrite`].
    PartialWrite,
    /// See [`StreamError::Rejected`].
    Rejected,
    /// See [`StreamError::InvalidConfig`].
    InvalidConfig,
}

/// Errors that can occur while writing to or closing a stream.
///
/// The type is `Clone` so that a latched error can be handed back to every
/// later caller; I/O errors are shared behind an [`Arc`] for that reason.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// An I/O error occurred in an underlying sink.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// The stream was already closed.
    #[error("stream is closed")]
    AlreadyClosed,

    /// The payload is larger than the quota of any segment and can never be written.
    #[error("write of {len} bytes exceeds max bytes {max_bytes}")]
    TooLargeWrite {
        /// Length of the rejected payload.
        len: usize,
        /// The quota it was checked against.
        max_bytes: u64,
    },

    /// The payload does not fit in the quota left on the current stream.
    #[error("write of {len} bytes would exceed quota ({written} of {max_bytes} bytes used)")]
    QuotaExceeded {
        /// Length of the rejected payload.
        len: usize,
        /// Bytes already accounted on the stream.
        written: u64,
        /// The quota it was checked against.
        max_bytes: u64,
    },

    /// Closing the inner stream after a quota rejection failed.
    #[error("failed to close stream after exceeding max bytes: {source}")]
    QuotaClose {
        /// The close failure.
        source: Box<StreamError>,
    },

    /// Closing a segment during rotation failed.
    #[error("failed to close segment {id}: {source}")]
    SegmentClose {
        /// Identifier of the segment being closed.
        id: String,
        /// The close failure.
        source: Box<StreamError>,
    },

    /// The segment factory failed to create a segment.
    #[error("failed to create segment {id}: {source}")]
    SegmentCreate {
        /// Identifier passed to the factory.
        id: String,
        /// The factory failure.
        source: Box<StreamError>,
    },

    /// A write failed after some bytes had already reached the sink.
    #[error("write failed after {written} bytes: {source}")]
    PartialWrite {
        /// Bytes the sink accepted before failing.
        written: usize,
        /// The underlying failure.
        source: Box<StreamError>,
    },

    /// A hook rejected the operation.
    #[error("operation rejected: {reason}")]
    Rejected {
        /// Why the hook rejected it.
        reason: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::Io(e) => e.kind(),
            StreamError::AlreadyClosed => io::ErrorKind::BrokenPipe,
            StreamError::TooLargeWrite { .. } | StreamError::InvalidConfig { .. } => {
                io::ErrorKind::InvalidInput
            }
            StreamError::PartialWrite { .. } => io::ErrorKind::WriteZero,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

impl StreamError {
    /// Creates a hook rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a partial write error.
    pub fn partial_write(written: usize, source: StreamError) -> Self {
        Self::PartialWrite {
            written,
            source: Box::new(source),
        }
    }

    /// Wraps a close failure raised while rejecting an over-quota write.
    pub fn quota_close(source: StreamError) -> Self {
        Self::QuotaClose {
            source: Box::new(source),
        }
    }

    /// Wraps a segment close failure.
    pub fn segment_close(id: impl Into<String>, source: StreamError) -> Self {
        Self::SegmentClose {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a segment factory failure.
    pub fn segment_create(id: impl Into<String>, source: StreamError) -> Self {
        Self::SegmentCreate {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::AlreadyClosed => ErrorKind::AlreadyClosed,
            Self::TooLargeWrite { .. } => ErrorKind::TooLargeWrite,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Self::QuotaClose { .. } => ErrorKind::QuotaClose,
            Self::SegmentClose { .. } => ErrorKind::SegmentClose,
            Self::SegmentCreate { .. } => ErrorKind::SegmentCreate,
            Self::PartialWrite { .. } => ErrorKind::PartialWrite,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    /// Bytes that reached the sink before this error was raised.
    ///
    /// Only [`StreamError::PartialWrite`] carries a non-zero count.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        match self {
            Self::PartialWrite { written, .. } => *written,
            _ => 0,
        }
    }

    /// Returns this error with any partial byte count stripped.
    ///
    /// For [`StreamError::PartialWrite`] that is the underlying failure;
    /// every other error is returned unchanged.
    #[must_use]
    pub fn without_progress(&self) -> StreamError {
        match self {
            Self::PartialWrite { source, .. } => source.without_progress(),
            other => other.clone(),
        }
    }

    /// Returns true for an overflow that no segment could ever absorb.
    #[must_use]
    pub fn is_permanent_overflow(&self) -> bool {
        matches!(self, Self::TooLargeWrite { .. })
    }

    /// Returns true for an overflow that a fresh segment would absorb.
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_clone() {
        let err: StreamError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        let copy = err.clone();
        assert_eq!(copy.kind(), ErrorKind::Io);
        assert_eq!(copy.to_string(), "I/O error: pipe");
    }

    #[test]
    fn partial_write_reports_count() {
        let err = StreamError::partial_write(3, StreamError::rejected("full"));
        assert_eq!(err.bytes_written(), 3);
        assert_eq!(StreamError::AlreadyClosed.bytes_written(), 0);
    }

    #[test]
    fn overflow_classification() {
        let permanent = StreamError::TooLargeWrite {
            len: 10,
            max_bytes: 5,
        };
        let transient = StreamError::QuotaExceeded {
            len: 2,
            written: 4,
            max_bytes: 5,
        };
        assert!(permanent.is_permanent_overflow());
        assert!(!permanent.is_quota_exceeded());
        assert!(transient.is_quota_exceeded());
        assert!(!transient.is_permanent_overflow());
    }

    #[test]
    fn converts_back_to_io_error() {
        let err: io::Error = StreamError::AlreadyClosed.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let original = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: io::Error = StreamError::from(original).into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn wrapped_errors_keep_context() {
        let err = StreamError::segment_create("00000001.data", StreamError::AlreadyClosed);
        assert_eq!(err.kind(), ErrorKind::SegmentCreate);
        assert_eq!(
            err.to_string(),
            "failed to create segment 00000001.data: stream is closed"
        );
    }

    #[test]
    fn without_progress_drops_partial_count() {
        let inner = StreamError::from(io::Error::new(io::ErrorKind::WriteZero, "full"));
        let partial = StreamError::partial_write(3, inner);

        let stripped = partial.without_progress();
        assert_eq!(stripped.kind(), ErrorKind::Io);
        assert_eq!(stripped.bytes_written(), 0);
        assert_eq!(StreamError::AlreadyClosed.without_progress().kind(), ErrorKind::AlreadyClosed);
    }
}
