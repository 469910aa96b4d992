//! Concurrent access through the mutual-exclusion decorator.

use spanio_stream::{ErrorKind, SegmentNaming, SpanWriter, SyncedWriter};
use spanio_testkit::SegmentStore;
use std::sync::Arc;
use std::thread;

const THREADS: u8 = 8;
const WRITES_PER_THREAD: usize = 200;
const PAYLOAD_LEN: usize = 4;

#[test]
fn synced_span_writer_rotates_atomically() {
    let store = SegmentStore::new();
    let span = SpanWriter::new(SegmentNaming::default().generator(), 10, store.factory());
    let writer = Arc::new(SyncedWriter::new(span));

    let workers: Vec<_> = (0..THREADS)
        .map(|id| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                let payload = [id; PAYLOAD_LEN];
                for _ in 0..WRITES_PER_THREAD {
                    assert_eq!(writer.write(&payload).unwrap(), PAYLOAD_LEN);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    writer.close().unwrap();

    let total = usize::from(THREADS) * WRITES_PER_THREAD;
    let segments = store.contents();
    assert_eq!(segments.len(), total / 2);
    for segment in &segments {
        // Two payloads fit in ten bytes; a third always forces a rotation.
        assert_eq!(segment.len(), 2 * PAYLOAD_LEN);
        for chunk in segment.chunks(PAYLOAD_LEN) {
            assert!(chunk.iter().all(|b| *b == chunk[0]), "interleaved write: {chunk:?}");
        }
    }
    assert!(store.all_closed());
}

#[test]
fn writes_after_shared_close_fail() {
    let store = SegmentStore::new();
    let span = SpanWriter::new(SegmentNaming::default().generator(), 8, store.factory());
    let writer = Arc::new(SyncedWriter::new(span));

    writer.write(b"abc").unwrap();
    writer.close().unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || writer.write(b"late").unwrap_err().kind())
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), ErrorKind::AlreadyClosed);
    }

    assert_eq!(store.contents(), vec![b"abc".to_vec()]);
}
