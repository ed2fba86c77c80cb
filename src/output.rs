//! CLI output formatting.
//!
//! `photo-picker pick` writes the JSON response to stdout, exactly what a
//! bridge caller would receive. With `--summary` it prints a human-readable
//! listing instead:
//!
//! ```text
//! Picked 2 of 3 images
//! 001 IMG_0001.jpg 100x75 (4.1 KB)
//!     Path: file:///tmp/photo_picker_images/image_0d6f....jpg
//!     Thumbnail: 100x75
//! 002 IMG_0003.jpg 75x100 (3.9 KB)
//!     Path: /9j/4AAQSkZJRgABAQAAAQABAAD…
//! ```
//!
//! Legacy responses carry no metadata, so each entry is just its index and
//! payload. Inline payloads are shortened for display.
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::artifact::{ArtifactRecord, PickResponse};
use crate::orchestrator::PickFailure;
use std::path::Path;

/// Inline payloads longer than this are cut in summaries.
const PAYLOAD_PREVIEW: usize = 32;

fn format_index(pos: usize) -> String {
    format!("{:03}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// File URIs are shown whole; base64 payloads are shortened.
fn preview_payload(payload: &str) -> String {
    if payload.starts_with("file://") || payload.chars().count() <= PAYLOAD_PREVIEW {
        return payload.to_string();
    }
    let head: String = payload.chars().take(PAYLOAD_PREVIEW).collect();
    format!("{}…", head)
}

fn record_lines(index: usize, record: &ArtifactRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}x{} ({})",
        format_index(index),
        record.file_name,
        record.width,
        record.height,
        format_bytes(record.file_size)
    )];
    lines.push(format!(
        "{}Path: {}",
        indent(1),
        preview_payload(&record.original_path)
    ));
    if let (Some(w), Some(h)) = (record.thumbnail_width, record.thumbnail_height) {
        lines.push(format!("{}Thumbnail: {}x{}", indent(1), w, h));
    }
    lines
}

/// Summary of a successful pick. `selected` is how many references the user chose.
pub fn format_pick_output(response: &PickResponse, selected: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if selected == 0 {
        lines.push("No images selected (cancelled)".to_string());
        return lines;
    }

    lines.push(format!("Picked {} of {} images", response.len(), selected));
    match response {
        PickResponse::Legacy(items) => {
            for (i, item) in items.iter().enumerate() {
                lines.push(format!("{} {}", format_index(i + 1), preview_payload(item)));
            }
        }
        PickResponse::Enhanced(records) => {
            for (i, record) in records.iter().enumerate() {
                lines.extend(record_lines(i + 1, record));
            }
        }
    }
    lines
}

pub fn print_pick_output(response: &PickResponse, selected: usize) {
    for line in format_pick_output(response, selected) {
        println!("{}", line);
    }
}

pub fn format_failure(failure: &PickFailure) -> Vec<String> {
    vec![format!("Pick failed: {}", failure.reason())]
}

pub fn format_clean_output(removed: usize, dir: &Path) -> Vec<String> {
    vec![format!("Removed {} cached images from {}", removed, dir.display())]
}

pub fn print_clean_output(removed: usize, dir: &Path) {
    for line in format_clean_output(removed, dir) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, path: &str, thumb: bool) -> ArtifactRecord {
        ArtifactRecord {
            original_path: path.to_string(),
            file_name: name.to_string(),
            file_size: 4200,
            mime_type: "image/jpeg".to_string(),
            width: 100,
            height: 75,
            thumbnail: thumb.then(|| "file:///c/t.jpg".to_string()),
            thumbnail_width: thumb.then_some(40),
            thumbnail_height: thumb.then_some(30),
            content_uri: None,
        }
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(4200), "4.1 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn preview_keeps_file_uris() {
        let uri = "file:///very/long/path/to/the/cache/photo_picker_images/image_x.jpg";
        assert_eq!(preview_payload(uri), uri);
    }

    #[test]
    fn preview_shortens_base64() {
        let payload = "A".repeat(100);
        let shown = preview_payload(&payload);
        assert!(shown.ends_with('…'));
        assert_eq!(shown.chars().count(), PAYLOAD_PREVIEW + 1);
    }

    #[test]
    fn enhanced_summary() {
        let response = PickResponse::Enhanced(vec![
            record("IMG_1.jpg", "file:///c/a.jpg", true),
            record("IMG_3.jpg", "file:///c/b.jpg", false),
        ]);
        let lines = format_pick_output(&response, 3);

        assert_eq!(lines[0], "Picked 2 of 3 images");
        assert_eq!(lines[1], "001 IMG_1.jpg 100x75 (4.1 KB)");
        assert_eq!(lines[2], "    Path: file:///c/a.jpg");
        assert_eq!(lines[3], "    Thumbnail: 40x30");
        assert_eq!(lines[4], "002 IMG_3.jpg 100x75 (4.1 KB)");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn legacy_summary() {
        let response = PickResponse::Legacy(vec!["file:///c/a.jpg".to_string()]);
        let lines = format_pick_output(&response, 1);
        assert_eq!(lines, vec!["Picked 1 of 1 images", "001 file:///c/a.jpg"]);
    }

    #[test]
    fn cancelled_summary() {
        let lines = format_pick_output(&PickResponse::Legacy(vec![]), 0);
        assert_eq!(lines, vec!["No images selected (cancelled)"]);
    }

    #[test]
    fn failure_line() {
        let lines = format_failure(&PickFailure::new("Permission denied"));
        assert_eq!(lines, vec!["Pick failed: Permission denied"]);
    }

    #[test]
    fn clean_line() {
        let lines = format_clean_output(3, Path::new("/tmp/photo_picker_images"));
        assert_eq!(lines, vec!["Removed 3 cached images from /tmp/photo_picker_images"]);
    }
}
