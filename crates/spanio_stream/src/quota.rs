//! Quota decorator.
//!
//! [`QuotaWriter`] caps the cumulative number of bytes a stream accepts.
//! It is assembled from a [`HookWriter`]: a pre-write hook checks the
//! payload against the remaining quota and a post-write hook accounts the
//! bytes the inner stream really took.
//!
//! ## Overflow
//!
//! A write that would push the total past `max_bytes` is rejected before it
//! reaches the inner stream, and the quota closes the inner stream. From then
//! on the writer is sealed: writes are rejected without touching the inner
//! stream and `close` succeeds without closing it a second time.
//!
//! The rejection tells callers whether a fresh stream could take the payload:
//! [`StreamError::TooLargeWrite`] when the payload alone is over the quota,
//! [`StreamError::QuotaExceeded`] when only the remaining quota is too small.

use crate::error::{StreamError, StreamResult};
use crate::hook::HookWriter;
use crate::stream::WriteStream;
use crate::synced::SyncedWriter;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
struct Usage {
    written: u64,
    tripped: bool,
}

/// A stream decorator enforcing a maximum cumulative byte count.
///
/// # Example
///
/// ```rust
/// use spanio_stream::{MemorySink, QuotaWriter, WriteStream};
///
/// let mut writer = QuotaWriter::new(MemorySink::new(), 8).unwrap();
/// writer.write(b"12345").unwrap();
/// assert!(writer.write(b"6789").unwrap_err().is_quota_exceeded());
/// assert!(writer.is_sealed());
/// ```
pub struct QuotaWriter<W> {
    inner: HookWriter<W>,
    usage: Arc<Mutex<Usage>>,
    max_bytes: u64,
    sealed: bool,
}

impl<W: WriteStream> QuotaWriter<W> {
    /// Wraps `inner` with a quota of `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if `max_bytes` is zero.
    pub fn new(inner: W, max_bytes: u64) -> StreamResult<Self> {
        if max_bytes == 0 {
            return Err(StreamError::invalid_config("max bytes must be greater than zero"));
        }

        let usage = Arc::new(Mutex::new(Usage::default()));
        let check = Arc::clone(&usage);
        let account = Arc::clone(&usage);

        let inner = HookWriter::new(inner)
            .pre_write(move |data: &[u8]| {
                let mut usage = check.lock();
                let len = data.len() as u64;
                if usage.written.saturating_add(len) > max_bytes {
                    usage.tripped = true;
                    return Err(overflow(data.len(), usage.written, max_bytes));
                }
                Ok(())
            })
            .post_write(move |_: &[u8], n: usize, _: Option<&StreamError>| {
                account.lock().written += n as u64;
            });

        Ok(Self {
            inner,
            usage,
            max_bytes,
            sealed: false,
        })
    }

    /// Returns the quota.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Returns the bytes accounted so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.usage.lock().written
    }

    /// Returns the bytes still available.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.max_bytes.saturating_sub(self.bytes_written())
    }

    /// Returns true once an overflow has closed the inner stream.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Seals the writer after its pre-write hook rejected a payload.
    fn seal(&mut self, rejection: StreamError) -> StreamError {
        self.sealed = true;
        trace!(max_bytes = self.max_bytes, "quota exceeded, closing stream");
        match self.inner.close() {
            Ok(()) => rejection,
            Err(e) => StreamError::quota_close(e),
        }
    }
}

fn overflow(len: usize, written: u64, max_bytes: u64) -> StreamError {
    if len as u64 > max_bytes {
        StreamError::TooLargeWrite { len, max_bytes }
    } else {
        StreamError::QuotaExceeded {
            len,
            written,
            max_bytes,
        }
    }
}

impl<W: WriteStream> WriteStream for QuotaWriter<W> {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        if self.sealed {
            return Err(overflow(data.len(), self.bytes_written(), self.max_bytes));
        }

        match self.inner.write(data) {
            Err(rejection) if std::mem::take(&mut self.usage.lock().tripped) => {
                Err(self.seal(rejection))
            }
            result => result,
        }
    }

    fn close(&mut self) -> StreamResult<()> {
        if self.sealed {
            return Ok(());
        }
        self.inner.close()
    }
}

/// A quota-limited stream behind a [`SyncedWriter`]: the per-segment stack
/// used by [`crate::SpanWriter`].
pub type LimitedWriter<W> = SyncedWriter<QuotaWriter<W>>;

/// Wraps `inner` so it accepts at most `max_bytes` bytes and serializes
/// every call.
///
/// # Errors
///
/// Returns [`StreamError::InvalidConfig`] if `max_bytes` is zero.
pub fn limited<W: WriteStream>(inner: W, max_bytes: u64) -> StreamResult<LimitedWriter<W>> {
    Ok(SyncedWriter::new(QuotaWriter::new(inner, max_bytes)?))
}

impl<W> std::fmt::Debug for QuotaWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaWriter")
            .field("max_bytes", &self.max_bytes)
            .field("bytes_written", &self.usage.lock().written)
            .field("sealed", &self.sealed)
            .finish_non_exhaustive()
    }
}
