//! # Spanio Testkit
//!
//! Test utilities for Spanio.
//!
//! This crate provides:
//! - An in-memory segment store usable as a [`spanio_stream::SpanWriter`] factory
//! - Sinks that fail on demand
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use spanio_stream::{SegmentNaming, SpanWriter, WriteStream};
//! use spanio_testkit::SegmentStore;
//!
//! let store = SegmentStore::new();
//! let mut writer = SpanWriter::new(SegmentNaming::default().generator(), 4, store.factory());
//! writer.write(b"abcd").unwrap();
//! writer.write(b"ef").unwrap();
//! assert_eq!(store.contents(), vec![b"abcd".to_vec(), b"ef".to_vec()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
