//! Segmenting writer.
//!
//! [`SpanWriter`] splits an unbounded byte stream into a sequence of
//! bounded segments. Each segment comes from a caller-supplied factory and
//! is wrapped in a [`LimitedWriter`]; when a write does not fit in the
//! current segment, the segment is closed, the next one is opened and the
//! write is retried once.
//!
//! ## States
//!
//! ```text
//!  new ──► Active ──close──► Closed
//!   │        │
//!   └────────┴──error──► Poisoned ──close──► Closed
//! ```
//!
//! - Segment 0 is opened by the constructor; a factory failure there leaves
//!   the writer poisoned
//! - Poisoned is a latch: every later write returns the same error without
//!   touching any segment
//! - Closed is terminal: every later call returns
//!   [`StreamError::AlreadyClosed`]
//!
//! ## Thread Safety
//!
//! `SpanWriter` does no locking of its own and rotation is not atomic across
//! callers. Share it as `SyncedWriter<SpanWriter>` so the whole
//! rotate-and-retry sequence runs under one lock.

use crate::config::SpanConfig;
use crate::error::{StreamError, StreamResult};
use crate::quota::{limited, LimitedWriter, QuotaWriter};
use crate::stream::WriteStream;
use tracing::{debug, trace, warn};

/// Maps a segment sequence number to a segment identifier.
pub type IdGenerator = Box<dyn Fn(u64) -> String + Send>;

/// Creates the stream backing the segment with the given identifier.
pub type SegmentFactory = Box<dyn FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send>;

/// Counters describing a [`SpanWriter`]'s activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStats {
    /// Segments successfully opened, including segment 0.
    pub segments_created: u64,
    /// Completed rotations.
    pub rotations: u64,
    /// Bytes accepted across all segments.
    pub bytes_written: u64,
}

struct Segment {
    id: String,
    writer: LimitedWriter<Box<dyn WriteStream>>,
}

enum SpanState {
    Active(Segment),
    Poisoned {
        error: StreamError,
        segment: Option<Segment>,
    },
    Closed,
}

/// A writer that rolls over to a new segment when the current one is full.
///
/// # Example
///
/// ```rust
/// use spanio_stream::{MemorySink, SegmentNaming, SpanWriter, WriteStream};
/// use std::collections::BTreeMap;
/// use std::sync::{Arc, Mutex};
///
/// let segments = Arc::new(Mutex::new(BTreeMap::new()));
/// let store = Arc::clone(&segments);
///
/// let mut writer = SpanWriter::new(SegmentNaming::default().generator(), 5, move |id: &str| {
///     let sink = MemorySink::new();
///     store.lock().unwrap().insert(id.to_string(), sink.handle());
///     Ok(Box::new(sink) as Box<dyn WriteStream>)
/// });
///
/// writer.write(b"1234").unwrap();
/// writer.write(b"56").unwrap();
/// writer.close().unwrap();
///
/// let segments = segments.lock().unwrap();
/// assert_eq!(segments["00000000.data"].data(), b"1234");
/// assert_eq!(segments["00000001.data"].data(), b"56");
/// ```
pub struct SpanWriter {
    generate_id: IdGenerator,
    factory: SegmentFactory,
    max_bytes: u64,
    sequence: u64,
    state: SpanState,
    stats: SpanStats,
}

impl SpanWriter {
    /// Creates a span writer and opens segment 0.
    ///
    /// If segment 0 cannot be opened the writer starts poisoned and every
    /// write returns that error. Use [`SpanWriter::try_new`] to get the
    /// error from the constructor instead.
    pub fn new<G, F>(generate_id: G, max_bytes: u64, factory: F) -> Self
    where
        G: Fn(u64) -> String + Send + 'static,
        F: FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send + 'static,
    {
        let generate_id: IdGenerator = Box::new(generate_id);
        let mut factory: SegmentFactory = Box::new(factory);

        let state = if max_bytes == 0 {
            let error = StreamError::invalid_config("max bytes must be greater than zero");
            warn!(%error, "span writer poisoned");
            SpanState::Poisoned {
                error,
                segment: None,
            }
        } else {
            match open_segment(&generate_id, &mut factory, max_bytes, 0) {
                Ok(segment) => SpanState::Active(segment),
                Err(error) => {
                    warn!(%error, "span writer poisoned");
                    SpanState::Poisoned {
                        error,
                        segment: None,
                    }
                }
            }
        };

        let segments_created = u64::from(matches!(state, SpanState::Active(_)));
        Self {
            generate_id,
            factory,
            max_bytes,
            sequence: 0,
            state,
            stats: SpanStats {
                segments_created,
                ..SpanStats::default()
            },
        }
    }

    /// Creates a span writer, failing if segment 0 cannot be opened.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] for a zero `max_bytes` or
    /// [`StreamError::SegmentCreate`] if the factory fails.
    pub fn try_new<G, F>(generate_id: G, max_bytes: u64, factory: F) -> StreamResult<Self>
    where
        G: Fn(u64) -> String + Send + 'static,
        F: FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send + 'static,
    {
        let writer = Self::new(generate_id, max_bytes, factory);
        if let SpanState::Poisoned { error, .. } = &writer.state {
            return Err(error.clone());
        }
        Ok(writer)
    }

    /// Creates a span writer from a configuration.
    ///
    /// Segment identifiers follow `config.naming` and each segment holds at
    /// most `config.max_segment_bytes` bytes.
    pub fn with_config<F>(config: &SpanConfig, factory: F) -> Self
    where
        F: FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send + 'static,
    {
        Self::new(
            config.naming.generator(),
            config.max_segment_bytes,
            factory,
        )
    }

    /// Returns the per-segment quota.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Returns the sequence number of the most recent segment attempt.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the identifier of the active segment.
    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        match &self.state {
            SpanState::Active(segment) => Some(&segment.id),
            _ => None,
        }
    }

    /// Returns the bytes accounted on the active segment.
    #[must_use]
    pub fn segment_bytes(&self) -> Option<u64> {
        match &self.state {
            SpanState::Active(segment) => {
                Some(segment.writer.with_inner(QuotaWriter::bytes_written))
            }
            _ => None,
        }
    }

    /// Returns true if an unrecoverable error has been latched.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        matches!(self.state, SpanState::Poisoned { .. })
    }

    /// Returns true once the writer has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, SpanState::Closed)
    }

    /// Returns activity counters.
    #[must_use]
    pub fn stats(&self) -> SpanStats {
        self.stats
    }

    /// Closes the active segment and opens the next one.
    ///
    /// Rotation only follows a quota rejection, and the quota has already
    /// closed the inner segment by then: a failing segment close surfaces
    /// as [`StreamError::QuotaClose`] from the write itself. This close
    /// releases the synced wrapper, so [`StreamError::SegmentClose`] is only
    /// reported if a segment stack closes differently.
    fn rotate(&mut self) -> StreamResult<()> {
        if let SpanState::Active(segment) = &self.state {
            if let Err(e) = segment.writer.close() {
                let error = StreamError::segment_close(segment.id.clone(), e);
                return Err(self.latch(error, None));
            }
            debug!(segment = %segment.id, "closed full segment");
        }

        self.sequence += 1;
        match open_segment(
            &self.generate_id,
            &mut self.factory,
            self.max_bytes,
            self.sequence,
        ) {
            Ok(segment) => {
                self.stats.segments_created += 1;
                self.stats.rotations += 1;
                self.state = SpanState::Active(segment);
                Ok(())
            }
            Err(error) => Err(self.latch(error, None)),
        }
    }

    /// Latches `error`, keeping the active segment so `close` can release it.
    fn poison(&mut self, error: StreamError) {
        let segment = match std::mem::replace(&mut self.state, SpanState::Closed) {
            SpanState::Active(segment) => Some(segment),
            _ => None,
        };
        self.latch(error, segment);
    }

    fn latch(&mut self, error: StreamError, segment: Option<Segment>) -> StreamError {
        warn!(%error, sequence = self.sequence, "span writer poisoned");
        self.state = SpanState::Poisoned {
            error: error.clone(),
            segment,
        };
        error
    }
}

fn open_segment(
    generate_id: &IdGenerator,
    factory: &mut SegmentFactory,
    max_bytes: u64,
    sequence: u64,
) -> StreamResult<Segment> {
    let id = generate_id(sequence);
    let stream = factory(&id).map_err(|e| StreamError::segment_create(id.as_str(), e))?;
    let writer = limited(stream, max_bytes)?;
    debug!(segment = %id, sequence, max_bytes, "opened segment");
    Ok(Segment { id, writer })
}

impl WriteStream for SpanWriter {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        let mut retried = false;
        loop {
            let segment = match &self.state {
                SpanState::Active(segment) => segment,
                SpanState::Poisoned { error, .. } => return Err(error.clone()),
                SpanState::Closed => return Err(StreamError::AlreadyClosed),
            };

            match segment.writer.write(data) {
                Ok(n) => {
                    self.stats.bytes_written += n as u64;
                    return Ok(n);
                }
                Err(e) if e.is_permanent_overflow() => {
                    trace!(len = data.len(), max_bytes = self.max_bytes, "write can never fit");
                    return Err(e);
                }
                Err(e) if e.is_quota_exceeded() && !retried => {
                    retried = true;
                    self.rotate()?;
                }
                Err(e) => {
                    self.stats.bytes_written += e.bytes_written() as u64;
                    // Later callers get the failure, not the bytes this call stored.
                    self.poison(e.without_progress());
                    return Err(e);
                }
            }
        }
    }

    fn close(&mut self) -> StreamResult<()> {
        match std::mem::replace(&mut self.state, SpanState::Closed) {
            SpanState::Closed => Err(StreamError::AlreadyClosed),
            SpanState::Active(segment) => {
                debug!(segment = %segment.id, "closing span writer");
                segment.writer.close()
            }
            SpanState::Poisoned {
                segment: Some(segment),
                ..
            } => segment.writer.close(),
            SpanState::Poisoned {
                error,
                segment: None,
            } => Err(error),
        }
    }
}

impl std::fmt::Debug for SpanWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanWriter")
            .field("max_bytes", &self.max_bytes)
            .field("sequence", &self.sequence)
            .field("current_id", &self.current_id())
            .field("poisoned", &self.is_poisoned())
            .field("closed", &self.is_closed())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, HookWriter, MemoryHandle, MemorySink, SegmentNaming};
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    type Store = Arc<Mutex<BTreeMap<String, MemoryHandle>>>;

    fn memory_span(max_bytes: u64) -> (SpanWriter, Store) {
        let store: Store = Arc::default();
        let segments = Arc::clone(&store);
        let writer = SpanWriter::new(
            SegmentNaming::default().generator(),
            max_bytes,
            move |id: &str| {
                let sink = MemorySink::new();
                segments.lock().insert(id.to_string(), sink.handle());
                Ok(Box::new(sink) as Box<dyn WriteStream>)
            },
        );
        (writer, store)
    }

    fn contents(store: &Store) -> Vec<(String, Vec<u8>)> {
        store
            .lock()
            .iter()
            .map(|(id, handle)| (id.clone(), handle.data()))
            .collect()
    }

    #[test]
    fn rolls_over_into_new_segments() {
        let (mut writer, store) = memory_span(5);

        writer.write(b"1234").unwrap();
        writer.write(b"56").unwrap();
        writer.write(b"56").unwrap();
        writer.write(b"78961").unwrap();

        let err = writer
            .write(b"writes > maxBytes will always fail")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLargeWrite);

        writer.close().unwrap();

        assert_eq!(
            contents(&store),
            vec![
                ("00000000.data".to_string(), b"1234".to_vec()),
                ("00000001.data".to_string(), b"5656".to_vec()),
                ("00000002.data".to_string(), b"78961".to_vec()),
            ]
        );

        let err = writer.write(b"write to closed stream").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyClosed);
        assert_eq!(writer.close().unwrap_err().kind(), ErrorKind::AlreadyClosed);
    }

    #[test]
    fn stats_track_rotation() {
        let (mut writer, _store) = memory_span(4);

        writer.write(b"abcd").unwrap();
        writer.write(b"ef").unwrap();
        assert_eq!(writer.segment_bytes(), Some(2));

        let stats = writer.stats();
        assert_eq!(stats.segments_created, 2);
        assert_eq!(stats.rotations, 1);
        assert_eq!(stats.bytes_written, 6);
        assert_eq!(writer.sequence(), 1);
        assert_eq!(writer.current_id(), Some("00000001.data"));
    }

    #[test]
    fn oversized_write_does_not_rotate() {
        let (mut writer, store) = memory_span(3);

        writer.write(b"ab").unwrap();
        assert!(writer.write(b"abcd").unwrap_err().is_permanent_overflow());
        assert_eq!(store.lock().len(), 1);
        assert!(!writer.is_poisoned());
    }

    #[test]
    fn write_after_oversized_write_moves_to_next_segment() {
        let (mut writer, store) = memory_span(3);

        writer.write(b"ab").unwrap();
        assert!(writer.write(b"abcd").is_err());
        writer.write(b"c").unwrap();

        assert_eq!(
            contents(&store),
            vec![
                ("00000000.data".to_string(), b"ab".to_vec()),
                ("00000001.data".to_string(), b"c".to_vec()),
            ]
        );
    }

    #[test]
    fn factory_failure_at_construction_poisons() {
        let mut writer = SpanWriter::new(
            |seq| format!("{seq}"),
            8,
            |_: &str| Err(StreamError::rejected("no space")),
        );

        assert!(writer.is_poisoned());
        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SegmentCreate);

        assert_eq!(writer.close().unwrap_err().kind(), ErrorKind::SegmentCreate);
        assert_eq!(writer.close().unwrap_err().kind(), ErrorKind::AlreadyClosed);
    }

    #[test]
    fn try_new_reports_factory_failure() {
        let result = SpanWriter::try_new(
            |seq| format!("{seq}"),
            8,
            |_: &str| Err(StreamError::rejected("no space")),
        );
        assert_eq!(result.unwrap_err().kind(), ErrorKind::SegmentCreate);
    }

    #[test]
    fn zero_max_bytes_poisons() {
        let (mut writer, store) = memory_span(0);
        assert!(writer.is_poisoned());
        assert!(store.lock().is_empty());
        assert_eq!(writer.write(b"x").unwrap_err().kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn factory_failure_during_rotation_latches() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let mut writer = SpanWriter::new(
            |seq| format!("seg-{seq}"),
            4,
            move |_: &str| {
                let mut calls = counter.lock();
                *calls += 1;
                if *calls > 1 {
                    return Err(StreamError::rejected("quota on disk"));
                }
                Ok(Box::new(MemorySink::new()) as Box<dyn WriteStream>)
            },
        );

        writer.write(b"abcd").unwrap();
        let err = writer.write(b"e").unwrap_err();
        assert!(
            matches!(&err, StreamError::SegmentCreate { id, .. } if id == "seg-1"),
            "unexpected error: {err}"
        );
        assert!(writer.is_poisoned());

        // The latch short-circuits without calling the factory again.
        assert_eq!(writer.write(b"f").unwrap_err().kind(), ErrorKind::SegmentCreate);
        assert_eq!(*calls.lock(), 2);

        // A failed attempt still consumes its sequence number.
        assert_eq!(writer.sequence(), 1);
    }

    #[test]
    fn close_failure_on_full_segment_latches() {
        let created = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&created);
        let mut writer = SpanWriter::new(
            |seq| format!("seg-{seq}"),
            4,
            move |_: &str| {
                *counter.lock() += 1;
                let failing = HookWriter::new(MemorySink::new())
                    .pre_close(|| Err(StreamError::rejected("flush failed")));
                Ok(Box::new(failing) as Box<dyn WriteStream>)
            },
        );

        writer.write(b"abcd").unwrap();
        let err = writer.write(b"e").unwrap_err();

        // The quota closes the full segment when it rejects the write.
        assert_eq!(err.kind(), ErrorKind::QuotaClose);
        assert!(writer.is_poisoned());
        assert_eq!(*created.lock(), 1);
    }

    #[test]
    fn inner_write_error_latches_and_close_releases_segment() {
        let store: Store = Arc::default();
        let segments = Arc::clone(&store);
        let mut writer = SpanWriter::new(
            |seq| format!("seg-{seq}"),
            16,
            move |id: &str| {
                let sink = MemorySink::with_capacity_limit(3);
                segments.lock().insert(id.to_string(), sink.handle());
                Ok(Box::new(sink) as Box<dyn WriteStream>)
            },
        );

        writer.write(b"ab").unwrap();
        let err = writer.write(b"cd").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialWrite);
        assert_eq!(writer.stats().bytes_written, 3);

        // The replayed error reports no progress for writes that stored nothing.
        let again = writer.write(b"e").unwrap_err();
        assert_eq!(again.kind(), ErrorKind::Io);
        assert_eq!(again.bytes_written(), 0);
        assert_eq!(writer.stats().bytes_written, 3);

        writer.close().unwrap();
        assert!(store.lock()["seg-0"].is_closed());
        assert!(writer.is_closed());
    }

    #[test]
    fn consecutive_writes_rotate_each_time() {
        let (mut writer, store) = memory_span(2);

        writer.write(b"ab").unwrap();
        writer.write(b"cd").unwrap();
        writer.write(b"e").unwrap();

        assert_eq!(store.lock().len(), 3);
        assert_eq!(writer.stats().rotations, 2);
    }

    #[test]
    fn debug_output_names_state() {
        let (writer, _store) = memory_span(4);
        let debug = format!("{writer:?}");
        assert!(debug.contains("00000000.data"));
    }
}
