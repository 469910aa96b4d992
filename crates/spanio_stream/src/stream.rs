//! Write stream trait definition.

use crate::error::StreamResult;

/// A closable, byte-oriented output stream.
///
/// Streams are **opaque sinks**. Decorators in this crate wrap exactly one
/// inner stream, take exclusive ownership of it, and add behavior around
/// `write` and `close` without changing what the sink does with the bytes.
///
/// # Invariants
///
/// - `write` returns the number of bytes the sink accepted, which may be
///   less than `data.len()`
/// - A write that fails after moving bytes reports them through
///   [`StreamError::PartialWrite`](crate::StreamError::PartialWrite)
/// - After a successful `close`, the stream must not be written again
/// - Streams must be `Send` so a stack can move between threads
///
/// # Implementors
///
/// - [`super::MemorySink`] - For testing and ephemeral output
/// - [`super::FileSink`] - For persistent output
/// - [`super::IoSink`] - For any [`std::io::Write`]
/// - The decorators: [`super::HookWriter`], [`super::QuotaWriter`],
///   [`super::SyncedWriter`] and [`super::SpanWriter`]
pub trait WriteStream: Send {
    /// Writes `data` to the stream.
    ///
    /// Returns how many bytes were accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed, a decorator rejects the
    /// write, or the underlying sink fails.
    fn write(&mut self, data: &[u8]) -> StreamResult<usize>;

    /// Closes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already closed or the underlying
    /// sink fails to release its resources.
    fn close(&mut self) -> StreamResult<()>;
}

impl<S: WriteStream + ?Sized> WriteStream for Box<S> {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        (**self).write(data)
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}

impl<S: WriteStream + ?Sized> WriteStream for &mut S {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        (**self).write(data)
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}
