//! File-based sinks for persistent segments.

use crate::config::SpanConfig;
use crate::error::{StreamError, StreamResult};
use crate::io::write_fully;
use crate::stream::WriteStream;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-backed write stream.
///
/// The file is created fresh; an existing file at the same path is never
/// overwritten. Writes go straight to the file with no buffering.
///
/// # Durability
///
/// - `close()` flushes the file and, if `sync_on_close` is set, calls
///   `File::sync_all()` before releasing it
///
/// # Example
///
/// ```no_run
/// use spanio_stream::{FileSink, WriteStream};
/// use std::path::Path;
///
/// let mut sink = FileSink::create(Path::new("00000000.data")).unwrap();
/// sink.write(b"persistent data").unwrap();
/// sink.close().unwrap();
/// ```
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
    sync_on_close: bool,
}

impl FileSink {
    /// Creates a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file already exists or cannot be created.
    pub fn create(path: &Path) -> StreamResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            sync_on_close: true,
        })
    }

    /// Creates a new file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be created.
    pub fn create_with_dirs(path: &Path) -> StreamResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::create(path)
    }

    /// Sets whether `close` syncs the file to disk.
    #[must_use]
    pub fn sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WriteStream for FileSink {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        let file = self.file.as_mut().ok_or(StreamError::AlreadyClosed)?;
        write_fully(file, data)
    }

    fn close(&mut self) -> StreamResult<()> {
        let mut file = self.file.take().ok_or(StreamError::AlreadyClosed)?;
        file.flush()?;
        if self.sync_on_close {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Creates one [`FileSink`] per segment inside a directory.
///
/// # Example
///
/// ```no_run
/// use spanio_stream::{FileSegmentFactory, SpanConfig, SpanWriter, WriteStream};
///
/// let config = SpanConfig::new().max_segment_bytes(1024);
/// let factory = FileSegmentFactory::from_config("out", &config);
/// let mut writer = SpanWriter::with_config(&config, factory.into_factory());
/// writer.write(b"hello").unwrap();
/// writer.close().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileSegmentFactory {
    dir: PathBuf,
    create_dirs: bool,
    sync_on_close: bool,
}

impl FileSegmentFactory {
    /// Creates a factory writing segments into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            create_dirs: true,
            sync_on_close: true,
        }
    }

    /// Creates a factory honoring the file options in `config`.
    #[must_use]
    pub fn from_config(dir: impl Into<PathBuf>, config: &SpanConfig) -> Self {
        Self {
            dir: dir.into(),
            create_dirs: config.create_dirs,
            sync_on_close: config.sync_on_close,
        }
    }

    /// Returns the segment directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the segment named `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment file cannot be created.
    pub fn create(&self, id: &str) -> StreamResult<FileSink> {
        let path = self.dir.join(id);
        let sink = if self.create_dirs {
            FileSink::create_with_dirs(&path)?
        } else {
            FileSink::create(&path)?
        };
        debug!(path = %path.display(), "created segment file");
        Ok(sink.sync_on_close(self.sync_on_close))
    }

    /// Turns this factory into a closure for [`crate::SpanWriter`].
    pub fn into_factory(
        self,
    ) -> impl FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send + 'static {
        move |id: &str| Ok(Box::new(self.create(id)?) as Box<dyn WriteStream>)
    }
}
