//! Split command implementation.

use serde::Serialize;
use spanio_stream::{FileSegmentFactory, SpanConfig, SpanWriter, WriteStream};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info};

/// Largest read issued against the input.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Split result.
#[derive(Debug, Serialize)]
pub struct SplitResult {
    /// Segment directory.
    pub dir: String,
    /// Maximum bytes per segment.
    pub max_bytes: u64,
    /// Number of segment files written.
    pub segments: u64,
    /// Total bytes written.
    pub bytes_written: u64,
}

/// Runs the split command.
pub fn run(
    dir: &Path,
    config: &SpanConfig,
    input: Option<&Path>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = match input {
        Some(path) => split(File::open(path)?, dir, config)?,
        None => split(io::stdin().lock(), dir, config)?,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Split into {} segment(s) in {}", result.segments, result.dir);
            println!("  Bytes written: {}", result.bytes_written);
            println!("  Max segment:   {} bytes", result.max_bytes);
        }
    }

    Ok(())
}

/// Writes everything from `reader` into segment files under `dir`.
///
/// Every segment except the last is filled to exactly `max_segment_bytes`.
pub fn split<R: Read>(
    mut reader: R,
    dir: &Path,
    config: &SpanConfig,
) -> Result<SplitResult, Box<dyn std::error::Error>> {
    config.validate()?;
    let factory = FileSegmentFactory::from_config(dir, config);
    let mut writer = SpanWriter::try_new(
        config.naming.generator(),
        config.max_segment_bytes,
        factory.into_factory(),
    )?;

    let max_bytes = config.max_segment_bytes;
    let buf_len = usize::try_from(max_bytes).map_or(READ_BUFFER_SIZE, |n| n.min(READ_BUFFER_SIZE));
    let mut buf = vec![0u8; buf_len];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        let mut pending = &buf[..n];
        while !pending.is_empty() {
            let room = match writer.segment_bytes() {
                Some(used) if used < max_bytes => max_bytes - used,
                _ => max_bytes,
            };
            let take = usize::try_from(room).map_or(pending.len(), |room| room.min(pending.len()));
            writer.write(&pending[..take])?;
            pending = &pending[take..];
        }
        debug!(bytes = n, "copied input chunk");
    }

    let stats = writer.stats();
    writer.close()?;
    info!(
        segments = stats.segments_created,
        bytes = stats.bytes_written,
        "split complete"
    );

    Ok(SplitResult {
        dir: dir.display().to_string(),
        max_bytes,
        segments: stats.segments_created,
        bytes_written: stats.bytes_written,
    })
}
