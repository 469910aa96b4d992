//! Test fixtures and sink helpers.
//!
//! Provides an in-memory segment store, sinks with injectable failures and
//! a temporary segment directory.

use parking_lot::Mutex;
use spanio_stream::{
    FileSegmentFactory, MemoryHandle, MemorySink, SpanConfig, StreamError, StreamResult,
    WriteStream,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Records every segment a span writer creates, in creation order.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: Arc<Mutex<Vec<(String, MemoryHandle)>>>,
    fail_after: Option<usize>,
}

impl SegmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose factory fails once `count` segments exist.
    #[must_use]
    pub fn failing_after(count: usize) -> Self {
        Self {
            segments: Arc::default(),
            fail_after: Some(count),
        }
    }

    /// Returns a segment factory backed by this store.
    pub fn factory(
        &self,
    ) -> impl FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send + 'static {
        let segments = Arc::clone(&self.segments);
        let fail_after = self.fail_after;
        move |id: &str| {
            let mut segments = segments.lock();
            if fail_after.is_some_and(|limit| segments.len() >= limit) {
                return Err(StreamError::rejected(format!("store refused segment {id}")));
            }
            let sink = MemorySink::new();
            segments.push((id.to_string(), sink.handle()));
            Ok(Box::new(sink) as Box<dyn WriteStream>)
        }
    }

    /// Number of segments created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.lock().len()
    }

    /// Returns true if no segment was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.lock().is_empty()
    }

    /// Identifiers in creation order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.segments.lock().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Segment contents in creation order.
    #[must_use]
    pub fn contents(&self) -> Vec<Vec<u8>> {
        self.segments
            .lock()
            .iter()
            .map(|(_, handle)| handle.data())
            .collect()
    }

    /// Contents of the segment named `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Vec<u8>> {
        self.segments
            .lock()
            .iter()
            .find(|(segment, _)| segment == id)
            .map(|(_, handle)| handle.data())
    }

    /// All segment contents joined in creation order.
    #[must_use]
    pub fn concatenated(&self) -> Vec<u8> {
        self.contents().concat()
    }

    /// Returns true if every created segment has been closed.
    #[must_use]
    pub fn all_closed(&self) -> bool {
        self.segments
            .lock()
            .iter()
            .all(|(_, handle)| handle.is_closed())
    }
}

/// A memory sink that fails on demand.
#[derive(Debug)]
pub struct FaultySink {
    inner: MemorySink,
    writes_before_failure: Option<usize>,
    close_error: Option<StreamError>,
}

impl FaultySink {
    /// Creates a sink that behaves like a [`MemorySink`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MemorySink::new(),
            writes_before_failure: None,
            close_error: None,
        }
    }

    /// Makes every write after the first `count` fail.
    #[must_use]
    pub fn fail_writes_after(mut self, count: usize) -> Self {
        self.writes_before_failure = Some(count);
        self
    }

    /// Makes `close` fail with `error`.
    #[must_use]
    pub fn fail_close(mut self, error: StreamError) -> Self {
        self.close_error = Some(error);
        self
    }

    /// Returns a handle observing the underlying memory sink.
    #[must_use]
    pub fn handle(&self) -> MemoryHandle {
        self.inner.handle()
    }
}

impl Default for FaultySink {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteStream for FaultySink {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        if let Some(remaining) = self.writes_before_failure.as_mut() {
            if *remaining == 0 {
                let error = io::Error::new(io::ErrorKind::Other, "injected write failure");
                return Err(error.into());
            }
            *remaining -= 1;
        }
        self.inner.write(data)
    }

    fn close(&mut self) -> StreamResult<()> {
        if let Some(error) = self.close_error.clone() {
            return Err(error);
        }
        self.inner.close()
    }
}

/// A temporary directory for file segments with automatic cleanup.
pub struct TempSegmentDir {
    dir: TempDir,
}

impl TempSegmentDir {
    /// Creates a new temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a file segment factory writing into this directory.
    #[must_use]
    pub fn factory(&self, config: &SpanConfig) -> FileSegmentFactory {
        FileSegmentFactory::from_config(self.dir.path(), config)
    }

    /// Segment file paths sorted by name.
    pub fn segment_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .expect("Failed to read segment directory")
            .map(|entry| entry.expect("Failed to read directory entry").path())
            .collect();
        paths.sort();
        paths
    }

    /// Contents of each segment file sorted by name.
    pub fn segment_contents(&self) -> Vec<Vec<u8>> {
        self.segment_paths()
            .iter()
            .map(|path| std::fs::read(path).expect("Failed to read segment"))
            .collect()
    }
}

impl Default for TempSegmentDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanio_stream::{ErrorKind, SegmentNaming, SpanWriter};

    #[test]
    fn store_records_creation_order() {
        let store = SegmentStore::new();
        let mut factory = store.factory();

        factory("b").unwrap().write(b"1").unwrap();
        factory("a").unwrap().write(b"2").unwrap();

        assert_eq!(store.ids(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(store.get("a"), Some(b"2".to_vec()));
        assert_eq!(store.concatenated(), b"12");
    }

    #[test]
    fn failing_store_refuses_extra_segments() {
        let store = SegmentStore::failing_after(1);
        let mut factory = store.factory();

        assert!(factory("0").is_ok());
        assert_eq!(factory("1").err().unwrap().kind(), ErrorKind::Rejected);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn faulty_sink_injects_failures() {
        let mut sink = FaultySink::new()
            .fail_writes_after(1)
            .fail_close(StreamError::rejected("close failed"));

        sink.write(b"ok").unwrap();
        assert_eq!(sink.write(b"no").unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(sink.close().unwrap_err().kind(), ErrorKind::Rejected);
        assert_eq!(sink.handle().data(), b"ok");
    }

    #[test]
    fn temp_dir_collects_file_segments() {
        let dir = TempSegmentDir::new();
        let config = SpanConfig::new().max_segment_bytes(2).sync_on_close(false);
        let mut writer = SpanWriter::new(
            SegmentNaming::default().generator(),
            2,
            dir.factory(&config).into_factory(),
        );

        writer.write(b"ab").unwrap();
        writer.write(b"c").unwrap();
        writer.close().unwrap();

        assert_eq!(dir.segment_contents(), vec![b"ab".to_vec(), b"c".to_vec()]);
    }
}
