//! # Spanio Stream
//!
//! Composable decorators for byte-oriented output streams.
//!
//! Every type here implements [`WriteStream`], a minimal `write` + `close`
//! capability. Decorators own exactly one inner stream and add behavior
//! around it without changing what the underlying sink does with the bytes,
//! so they stack in any order.
//!
//! ## Decorators
//!
//! - [`HookWriter`] - Ordered pre/post write and pre/post close callbacks
//! - [`QuotaWriter`] - Caps the cumulative bytes a stream accepts
//! - [`SyncedWriter`] - Serializes all calls; close runs at most once
//! - [`SpanWriter`] - Splits a stream into bounded segments, rotating to a
//!   new segment when the current one is full
//!
//! ## Sinks
//!
//! - [`MemorySink`] - For testing and ephemeral output
//! - [`FileSink`] - For persistent output, see [`FileSegmentFactory`]
//! - [`IoSink`] - Wraps any [`std::io::Write`]
//!
//! ## Example
//!
//! ```rust
//! use spanio_stream::{MemorySink, QuotaWriter, WriteStream};
//!
//! let sink = MemorySink::new();
//! let handle = sink.handle();
//!
//! let mut writer = QuotaWriter::new(sink, 11).unwrap();
//! writer.write(b"hello world").unwrap();
//! assert!(writer.write(b"!").is_err());
//! assert_eq!(handle.data(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod file;
mod hook;
mod io;
mod memory;
mod naming;
mod quota;
mod span;
mod stream;
mod synced;

pub use config::SpanConfig;
pub use error::{ErrorKind, StreamError, StreamResult};
pub use file::{FileSegmentFactory, FileSink};
pub use hook::{HookWriter, PostCloseHook, PostWriteHook, PreCloseHook, PreWriteHook};
pub use io::{IoSink, StreamWriter};
pub use memory::{MemoryHandle, MemorySink};
pub use naming::SegmentNaming;
pub use quota::{limited, LimitedWriter, QuotaWriter};
pub use span::{IdGenerator, SegmentFactory, SpanStats, SpanWriter};
pub use stream::WriteStream;
pub use synced::SyncedWriter;

/// Version of the stream library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
