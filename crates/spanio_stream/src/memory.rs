//! In-memory sink for testing.

use crate::error::{StreamError, StreamResult};
use crate::stream::WriteStream;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    data: Vec<u8>,
    closed: bool,
    write_calls: usize,
    close_calls: usize,
}

/// An in-memory write stream.
///
/// This sink keeps everything written to it in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral output that doesn't need persistence
///
/// The contents stay observable through a [`MemoryHandle`] after the sink
/// itself has been moved into a decorator stack.
///
/// # Example
///
/// ```rust
/// use spanio_stream::{MemorySink, WriteStream};
///
/// let mut sink = MemorySink::new();
/// let handle = sink.handle();
/// sink.write(b"test data").unwrap();
/// sink.close().unwrap();
/// assert_eq!(handle.data(), b"test data");
/// assert!(handle.is_closed());
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
    capacity: Option<usize>,
}

impl MemorySink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that accepts at most `capacity` bytes in total.
    ///
    /// A write crossing the limit stores what fits and fails with
    /// [`StreamError::PartialWrite`]. Useful for testing short writes.
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            state: Arc::default(),
            capacity: Some(capacity),
        }
    }

    /// Returns a handle observing this sink.
    #[must_use]
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl WriteStream for MemorySink {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StreamError::AlreadyClosed);
        }
        state.write_calls += 1;

        let room = self
            .capacity
            .map_or(usize::MAX, |cap| cap.saturating_sub(state.data.len()));
        if data.len() <= room {
            state.data.extend_from_slice(data);
            return Ok(data.len());
        }

        state.data.extend_from_slice(&data[..room]);
        let exhausted = io::Error::new(io::ErrorKind::WriteZero, "memory sink capacity exhausted");
        if room == 0 {
            return Err(exhausted.into());
        }
        Err(StreamError::partial_write(room, exhausted.into()))
    }

    fn close(&mut self) -> StreamResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StreamError::AlreadyClosed);
        }
        state.close_calls += 1;
        state.closed = true;
        Ok(())
    }
}

/// A shared view of a [`MemorySink`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryHandle {
    /// Returns a copy of everything written so far.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().data.is_empty()
    }

    /// Returns true once the sink has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of writes that reached the sink while it was open.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.state.lock().write_calls
    }

    /// Number of successful closes.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }
}
