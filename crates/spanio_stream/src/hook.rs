//! Hook decorator.
//!
//! [`HookWriter`] runs ordered callbacks around the `write` and `close`
//! calls of the stream it wraps.
//!
//! ## Ordering
//!
//! - Hooks run synchronously, on the calling thread, in registration order
//! - The first failing pre-hook aborts the operation; the inner stream is
//!   not touched and the hook's error is returned
//! - Post-hooks always run once the inner call happened. They observe the
//!   outcome but cannot change it

use crate::error::{StreamError, StreamResult};
use crate::stream::WriteStream;

/// Callback run before a write. An error aborts the write.
pub type PreWriteHook = Box<dyn FnMut(&[u8]) -> StreamResult<()> + Send>;

/// Callback run after a write with the payload, the bytes accepted and the
/// error, if any.
pub type PostWriteHook = Box<dyn FnMut(&[u8], usize, Option<&StreamError>) + Send>;

/// Callback run before a close. An error aborts the close.
pub type PreCloseHook = Box<dyn FnMut() -> StreamResult<()> + Send>;

/// Callback run after a close with the close error, if any.
pub type PostCloseHook = Box<dyn FnMut(Option<&StreamError>) + Send>;

/// A stream decorator with pre/post write and pre/post close hooks.
///
/// # Example
///
/// ```rust
/// use spanio_stream::{HookWriter, MemorySink, StreamError, WriteStream};
///
/// let sink = MemorySink::new();
/// let handle = sink.handle();
///
/// let mut writer = HookWriter::new(sink).pre_write(|data: &[u8]| {
///     if data.starts_with(b"#") {
///         return Err(StreamError::rejected("comment"));
///     }
///     Ok(())
/// });
///
/// assert!(writer.write(b"# skipped").is_err());
/// writer.write(b"kept").unwrap();
/// assert_eq!(handle.data(), b"kept");
/// ```
pub struct HookWriter<W> {
    inner: W,
    pre_write: Vec<PreWriteHook>,
    post_write: Vec<PostWriteHook>,
    pre_close: Vec<PreCloseHook>,
    post_close: Vec<PostCloseHook>,
}

impl<W: WriteStream> HookWriter<W> {
    /// Wraps `inner` with no hooks registered.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pre_write: Vec::new(),
            post_write: Vec::new(),
            pre_close: Vec::new(),
            post_close: Vec::new(),
        }
    }

    /// Wraps `inner` with the given pre-write hooks.
    #[must_use]
    pub fn with_pre_write(inner: W, hooks: Vec<PreWriteHook>) -> Self {
        let mut writer = Self::new(inner);
        writer.pre_write = hooks;
        writer
    }

    /// Wraps `inner` with the given post-write hooks.
    #[must_use]
    pub fn with_post_write(inner: W, hooks: Vec<PostWriteHook>) -> Self {
        let mut writer = Self::new(inner);
        writer.post_write = hooks;
        writer
    }

    /// Wraps `inner` with the given pre-close hooks.
    #[must_use]
    pub fn with_pre_close(inner: W, hooks: Vec<PreCloseHook>) -> Self {
        let mut writer = Self::new(inner);
        writer.pre_close = hooks;
        writer
    }

    /// Wraps `inner` with the given post-close hooks.
    #[must_use]
    pub fn with_post_close(inner: W, hooks: Vec<PostCloseHook>) -> Self {
        let mut writer = Self::new(inner);
        writer.post_close = hooks;
        writer
    }

    /// Appends a pre-write hook.
    #[must_use]
    pub fn pre_write<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&[u8]) -> StreamResult<()> + Send + 'static,
    {
        self.pre_write.push(Box::new(hook));
        self
    }

    /// Appends a post-write hook.
    #[must_use]
    pub fn post_write<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&[u8], usize, Option<&StreamError>) + Send + 'static,
    {
        self.post_write.push(Box::new(hook));
        self
    }

    /// Appends a pre-close hook.
    #[must_use]
    pub fn pre_close<F>(mut self, hook: F) -> Self
    where
        F: FnMut() -> StreamResult<()> + Send + 'static,
    {
        self.pre_close.push(Box::new(hook));
        self
    }

    /// Appends a post-close hook.
    #[must_use]
    pub fn post_close<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Option<&StreamError>) + Send + 'static,
    {
        self.post_close.push(Box::new(hook));
        self
    }

    /// Returns a reference to the wrapped stream.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Drops the hooks and returns the wrapped stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: WriteStream> WriteStream for HookWriter<W> {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        for hook in &mut self.pre_write {
            hook(data)?;
        }

        let result = self.inner.write(data);

        let (written, error) = match &result {
            Ok(n) => (*n, None),
            Err(e) => (e.bytes_written(), Some(e)),
        };
        for hook in &mut self.post_write {
            hook(data, written, error);
        }

        result
    }

    fn close(&mut self) -> StreamResult<()> {
        for hook in &mut self.pre_close {
            hook()?;
        }

        let result = self.inner.close();

        for hook in &mut self.post_close {
            hook(result.as_ref().err());
        }

        result
    }
}

impl<W> std::fmt::Debug for HookWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookWriter")
            .field("pre_write", &self.pre_write.len())
            .field("post_write", &self.post_write.len())
            .field("pre_close", &self.pre_close.len())
            .field("post_close", &self.post_close.len())
            .finish_non_exhaustive()
    }
}
