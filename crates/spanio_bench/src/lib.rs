//! Benchmark utilities.

use spanio_stream::{IoSink, StreamResult, WriteStream};

/// Generate patterned data of the specified size.
pub fn patterned_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// A segment factory whose segments discard their bytes.
pub fn discarding_factory(
) -> impl FnMut(&str) -> StreamResult<Box<dyn WriteStream>> + Send + 'static {
    |_: &str| Ok(Box::new(IoSink::new(std::io::sink())) as Box<dyn WriteStream>)
}
