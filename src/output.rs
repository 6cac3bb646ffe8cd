//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Identify
//!
//! ```text
//! photo.jpg
//!     Format: JPEG (image/jpeg)
//!     Size: 2000x1000
//! ```
//!
//! ## Convert
//!
//! ```text
//! photo.jpg → thumb.png
//!     001 resize=800x0: 2000x1000 → 800x400
//!     002 adaptive=300x300: 800x400 → 300x300
//! Saved 300x300 PNG
//! ```
//!
//! ## Batch
//!
//! ```text
//! Processing 3 images
//!     trips/dawn.jpg: 2000x1000 → 300x300
//!     broken.png: FAILED Unsupported format: ...
//! Processed 2 images, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchReport};
use crate::imaging::{Dimensions, ImageFormat};
use crate::recipe::Step;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// identify
// ============================================================================

pub fn format_identify(path: &Path, format: ImageFormat, size: Dimensions) -> Vec<String> {
    vec![
        path.display().to_string(),
        format!("{}Format: {} ({})", indent(1), format, format.mime_type()),
        format!("{}Size: {}", indent(1), size),
    ]
}

pub fn print_identify(path: &Path, format: ImageFormat, size: Dimensions) {
    for line in format_identify(path, format, size) {
        println!("{}", line);
    }
}

// ============================================================================
// convert
// ============================================================================

/// One line per applied operation: `001 resize=800x0: 2000x1000 → 800x400`.
pub fn format_steps(steps: &[Step]) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "{}{} {}: {} → {}",
                indent(1),
                format_index(i + 1),
                step.operation,
                step.before,
                step.after
            )
        })
        .collect()
}

pub fn format_convert_output(
    input: &Path,
    output: &Path,
    steps: &[Step],
    size: Dimensions,
    format: ImageFormat,
) -> Vec<String> {
    let mut lines = vec![format!("{} → {}", input.display(), output.display())];
    lines.extend(format_steps(steps));
    lines.push(format!("Saved {} {}", size, format));
    lines
}

pub fn print_convert_output(
    input: &Path,
    output: &Path,
    steps: &[Step],
    size: Dimensions,
    format: ImageFormat,
) {
    for line in format_convert_output(input, output, steps, size, format) {
        println!("{}", line);
    }
}

// ============================================================================
// batch
// ============================================================================

pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => vec![format!("Processing {}", plural(*total, "image"))],
        BatchEvent::Processed {
            source,
            before,
            after,
        } => vec![format!(
            "{}{}: {} → {}",
            indent(1),
            source.display(),
            before,
            after
        )],
        BatchEvent::Failed { source, error } => {
            vec![format!("{}{}: FAILED {}", indent(1), source.display(), error)]
        }
    }
}

pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let processed = plural(report.processed.len(), "image");
    if report.failed.is_empty() {
        vec![format!("Processed {}", processed)]
    } else {
        vec![format!(
            "Processed {}, {} failed",
            processed,
            report.failed.len()
        )]
    }
}

pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}
