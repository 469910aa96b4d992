//! Inspect command implementation.

use serde::Serialize;
use spanio_stream::SegmentNaming;
use std::path::{Path, PathBuf};

/// Segment directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Segment directory.
    pub dir: String,
    /// Number of segments found.
    pub segment_count: usize,
    /// Total size in bytes.
    pub total_size: u64,
    /// Sequence numbers missing between the first and last segment.
    pub gaps: Vec<u64>,
    /// Segments in sequence order.
    pub segments: Vec<SegmentInfo>,
}

/// A single segment file.
#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    /// Sequence number parsed from the file name.
    pub sequence: u64,
    /// File name.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Full path.
    #[serde(skip)]
    pub path: PathBuf,
}

/// Runs the inspect command.
pub fn run(
    dir: &Path,
    naming: &SegmentNaming,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(dir, naming)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

/// Collects the segments of `dir` that match `naming`.
pub fn inspect(
    dir: &Path,
    naming: &SegmentNaming,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("No segment directory found at {:?}", dir).into());
    }

    let segments = list_segments(dir, naming)?;
    let total_size = segments.iter().map(|s| s.size).sum();

    let mut gaps = Vec::new();
    for pair in segments.windows(2) {
        gaps.extend(pair[0].sequence + 1..pair[1].sequence);
    }

    Ok(InspectResult {
        dir: dir.display().to_string(),
        segment_count: segments.len(),
        total_size,
        gaps,
        segments,
    })
}

/// Lists segment files in sequence order, ignoring files the naming
/// scheme did not produce.
pub fn list_segments(
    dir: &Path,
    naming: &SegmentNaming,
) -> Result<Vec<SegmentInfo>, Box<dyn std::error::Error>> {
    let mut segments = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(sequence) = naming.parse(&name) else {
            continue;
        };
        segments.push(SegmentInfo {
            sequence,
            size: entry.metadata()?.len(),
            path: entry.path(),
            name,
        });
    }
    segments.sort_by_key(|s| s.sequence);
    Ok(segments)
}

fn print_text_output(result: &InspectResult) {
    println!("Spanio Segment Inspection");
    println!("=========================");
    println!();
    println!("Directory: {}", result.dir);
    println!();
    println!("Segments:");
    println!("  Count:       {}", result.segment_count);
    println!("  Total size:  {}", format_size(result.total_size));
    if !result.gaps.is_empty() {
        println!("  Missing:     {:?}", result.gaps);
    }

    if !result.segments.is_empty() {
        println!();
        for segment in &result.segments {
            println!(
                "  [{}] {} ({})",
                segment.sequence,
                segment.name,
                format_size(segment.size)
            );
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_segments_in_sequence_order() {
        let dir = tempdir().unwrap();
        let naming = SegmentNaming::new("part-", 2, ".bin");
        std::fs::write(dir.path().join("part-10.bin"), b"ten").unwrap();
        std::fs::write(dir.path().join("part-02.bin"), b"two!").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let result = inspect(dir.path(), &naming).unwrap();

        assert_eq!(result.segment_count, 2);
        assert_eq!(result.total_size, 7);
        let names: Vec<_> = result.segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["part-02.bin", "part-10.bin"]);
        assert_eq!(result.gaps, (3..10).collect::<Vec<u64>>());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let naming = SegmentNaming::default();
        assert!(inspect(&dir.path().join("absent"), &naming).is_err());
    }

    #[test]
    fn json_output_skips_paths() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("00000000.data"), b"x").unwrap();

        let result = inspect(dir.path(), &SegmentNaming::default()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["segments"][0]["name"], "00000000.data");
        assert!(json["segments"][0].get("path").is_none());
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
