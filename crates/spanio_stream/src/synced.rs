//! Mutual-exclusion decorator.

use crate::error::{StreamError, StreamResult};
use crate::stream::WriteStream;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct Guarded<W> {
    inner: W,
    is_closed: bool,
}

/// A stream decorator that serializes every operation on the wrapped stream.
///
/// `write` and `close` take `&self` and run under a single lock, so the
/// decorator can be shared between threads, typically as
/// `Arc<SyncedWriter<W>>`, which also implements [`WriteStream`].
///
/// # Close semantics
///
/// The first `close` is forwarded to the inner stream and marks the writer
/// closed whatever its outcome. Every later `write` or `close` fails with
/// [`StreamError::AlreadyClosed`] without touching the inner stream, so the
/// inner close runs at most once.
///
/// # Example
///
/// ```rust
/// use spanio_stream::{MemorySink, SyncedWriter};
/// use std::sync::Arc;
/// use std::thread;
///
/// let sink = MemorySink::new();
/// let handle = sink.handle();
/// let writer = Arc::new(SyncedWriter::new(sink));
///
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let writer = Arc::clone(&writer);
///         thread::spawn(move || writer.write(b"ab").unwrap())
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// writer.close().unwrap();
/// assert_eq!(handle.len(), 8);
/// assert!(writer.close().is_err());
/// ```
#[derive(Debug)]
pub struct SyncedWriter<W> {
    guarded: Mutex<Guarded<W>>,
}

impl<W: WriteStream> SyncedWriter<W> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            guarded: Mutex::new(Guarded {
                inner,
                is_closed: false,
            }),
        }
    }

    /// Writes `data` to the inner stream under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyClosed`] after a close, or whatever the
    /// inner stream returns.
    pub fn write(&self, data: &[u8]) -> StreamResult<usize> {
        let mut guarded = self.guarded.lock();
        if guarded.is_closed {
            return Err(StreamError::AlreadyClosed);
        }
        guarded.inner.write(data)
    }

    /// Closes the inner stream under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyClosed`] after a previous close, or the
    /// inner close error.
    pub fn close(&self) -> StreamResult<()> {
        let mut guarded = self.guarded.lock();
        if guarded.is_closed {
            return Err(StreamError::AlreadyClosed);
        }
        guarded.is_closed = true;
        guarded.inner.close()
    }

    /// Returns true once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.guarded.lock().is_closed
    }

    /// Runs `f` with the inner stream while holding the lock.
    pub fn with_inner<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.guarded.lock().inner)
    }

    /// Returns the inner stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.guarded.into_inner().inner
    }
}

impl<W: WriteStream> WriteStream for SyncedWriter<W> {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        SyncedWriter::<W>::write(self, data)
    }

    fn close(&mut self) -> StreamResult<()> {
        SyncedWriter::<W>::close(self)
    }
}

impl<W: WriteStream> WriteStream for Arc<SyncedWriter<W>> {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        SyncedWriter::<W>::write(self, data)
    }

    fn close(&mut self) -> StreamResult<()> {
        SyncedWriter::<W>::close(self)
    }
}
