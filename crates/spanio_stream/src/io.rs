//! Adapters between [`std::io::Write`] and [`WriteStream`].
//!
//! - [`IoSink`] turns any `io::Write` into a closable stream, with a custom
//!   close callback or a flush on close
//! - [`StreamWriter`] exposes a decorated stream as an `io::Write`, so
//!   `write_all`, `io::copy` and friends can feed it

use crate::error::{StreamError, StreamResult};
use crate::stream::WriteStream;
use std::io::{self, Write};

/// Writes all of `data`, retrying short writes and interruptions.
///
/// A failure after some bytes were written is reported as
/// [`StreamError::PartialWrite`] so callers can account them.
pub(crate) fn write_fully<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> StreamResult<usize> {
    let mut written = 0;
    while written < data.len() {
        let error = match writer.write(&data[written..]) {
            Ok(0) => io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes"),
            Ok(n) => {
                written += n;
                continue;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => e,
        };
        if written == 0 {
            return Err(error.into());
        }
        return Err(StreamError::partial_write(written, error.into()));
    }
    Ok(written)
}

type Closer<W> = Box<dyn FnOnce(W) -> io::Result<()> + Send>;

/// A [`WriteStream`] over any [`io::Write`].
///
/// # Example
///
/// ```rust
/// use spanio_stream::{IoSink, WriteStream};
///
/// let mut sink = IoSink::with_closer(Vec::new(), |buf: Vec<u8>| {
///     assert_eq!(buf, b"abc");
///     Ok(())
/// });
/// sink.write(b"abc").unwrap();
/// sink.close().unwrap();
/// assert!(sink.write(b"d").is_err());
/// ```
pub struct IoSink<W> {
    writer: Option<W>,
    closer: Option<Closer<W>>,
}

impl<W: Write + Send> IoSink<W> {
    /// Wraps `writer`; closing flushes it and drops it.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            closer: None,
        }
    }

    /// Wraps `writer`; closing hands it to `closer`.
    #[must_use]
    pub fn with_closer<F>(writer: W, closer: F) -> Self
    where
        F: FnOnce(W) -> io::Result<()> + Send + 'static,
    {
        Self {
            writer: Some(writer),
            closer: Some(Box::new(closer)),
        }
    }

    /// Returns the wrapped writer, or `None` once closed.
    #[must_use]
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }
}

impl<W: Write + Send> WriteStream for IoSink<W> {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        let writer = self.writer.as_mut().ok_or(StreamError::AlreadyClosed)?;
        write_fully(writer, data)
    }

    fn close(&mut self) -> StreamResult<()> {
        let mut writer = self.writer.take().ok_or(StreamError::AlreadyClosed)?;
        match self.closer.take() {
            Some(closer) => closer(writer)?,
            None => writer.flush()?,
        }
        Ok(())
    }
}

impl<W> std::fmt::Debug for IoSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoSink")
            .field("closed", &self.writer.is_none())
            .field("custom_closer", &self.closer.is_some())
            .finish()
    }
}

/// An [`io::Write`] over a [`WriteStream`].
///
/// Partial writes surface as short counts, as `io::Write` expects; other
/// stream errors are converted to [`io::Error`]s that keep the original
/// [`StreamError`] as their inner error.
#[derive(Debug)]
pub struct StreamWriter<S> {
    stream: S,
}

impl<S: WriteStream> StreamWriter<S> {
    /// Wraps `stream`.
    #[must_use]
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Closes the wrapped stream.
    ///
    /// # Errors
    ///
    /// Returns the stream's close error.
    pub fn close(&mut self) -> StreamResult<()> {
        self.stream.close()
    }

    /// Returns a reference to the wrapped stream.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Returns the wrapped stream.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: WriteStream> Write for StreamWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream.write(buf) {
            Ok(n) => Ok(n),
            Err(StreamError::PartialWrite { written, .. }) => Ok(written),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
