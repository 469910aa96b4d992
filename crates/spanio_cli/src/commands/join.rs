//! Join command implementation.

use super::inspect::list_segments;
use spanio_stream::SegmentNaming;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Runs the join command.
pub fn run(
    dir: &Path,
    naming: &SegmentNaming,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
            let bytes = join(dir, naming, &mut file)?;
            file.sync_all()?;
            println!("Joined {} bytes into {}", bytes, path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            join(dir, naming, &mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Copies every segment of `dir` into `out` in sequence order.
///
/// Returns the number of bytes copied.
pub fn join<W: Write>(
    dir: &Path,
    naming: &SegmentNaming,
    out: &mut W,
) -> Result<u64, Box<dyn std::error::Error>> {
    let segments = list_segments(dir, naming)?;
    if segments.is_empty() {
        return Err(format!("No segments found in {:?}", dir).into());
    }

    let mut total = 0;
    for segment in &segments {
        let copied = io::copy(&mut File::open(&segment.path)?, out)?;
        debug!(segment = %segment.name, bytes = copied, "joined segment");
        total += copied;
    }
    info!(segments = segments.len(), bytes = total, "join complete");
    Ok(total)
}
