//! CLI output formatting for batch runs.
//!
//! # Output Format
//!
//! ```text
//! ==> to-png: 3 files (1 skipped)
//! a.jpg converted to png → a.png (100x100)
//! c.jpg: DecodeError (Failed to decode in/c.jpg: ...)
//! e.jpg converted to png → e.png (640x480)
//!
//! Done: 2 converted, 1 failed, 1 skipped
//! Failed:
//!     c.jpg: DecodeError
//! ```
//!
//! Per-file lines appear in completion order, which is not sorted when the
//! batch runs on several workers. The summary is always sorted.
//!
//! # Architecture
//!
//! Each piece has a `format_*` function (returns `String` or `Vec<String>`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::engine::{
    BatchEvent, BatchSummary, BatchTransformEngine, EngineError, EngineOptions, FileResult,
    Outcome,
};
use crate::request::{TransformKind, TransformRequest};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Format the status line for one processed file.
///
/// ```text
/// a.jpg converted to png → a.png (100x100)
/// photo.png resized (320x240)
/// c.jpg: DecodeError (Failed to decode ...)
/// ```
pub fn format_file_result(kind: TransformKind, result: &FileResult) -> String {
    match result.outcome {
        Outcome::Converted => {
            let dims = result
                .dimensions
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            match result.output.as_deref() {
                Some(output) if output != result.filename => format!(
                    "{} {} → {}{}",
                    result.filename,
                    kind.status_verb(),
                    output,
                    dims
                ),
                _ => format!("{} {}{}", result.filename, kind.status_verb(), dims),
            }
        }
        Outcome::Failed => {
            let kind = result
                .error_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "Error".to_string());
            match result.error.as_deref() {
                Some(message) => format!("{}: {} ({})", result.filename, kind, message),
                None => format!("{}: {}", result.filename, kind),
            }
        }
        Outcome::Skipped => format!("{} skipped", result.filename),
    }
}

/// Format a single progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started {
            kind,
            eligible,
            skipped,
        } => {
            let mut header = format!("==> {}: {}", kind, plural(*eligible, "file", "files"));
            if *skipped > 0 {
                header.push_str(&format!(" ({skipped} skipped)"));
            }
            vec![header]
        }
        BatchEvent::FileProcessed { kind, result } => vec![format_file_result(*kind, result)],
    }
}

/// Format the end-of-batch summary.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Done: {} converted, {} failed, {} skipped",
            summary.converted(),
            summary.failed(),
            summary.skipped()
        ),
    ];

    if let Some(ref file) = summary.aborted_on {
        lines.push(format!("Aborted after {file}"));
    }

    let failures: Vec<&FileResult> = summary.failures().collect();
    if !failures.is_empty() {
        lines.push("Failed:".to_string());
        for failure in failures {
            let kind = failure
                .error_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "Error".to_string());
            lines.push(format!("{}{}: {}", indent(1), failure.filename, kind));
        }
    }

    lines
}

/// Print the summary to stdout.
pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

/// Run one batch on the image backend, printing each event as it arrives.
///
/// Events travel over a channel to a printer thread so lines from parallel
/// workers never interleave.
pub fn run_with_progress(
    options: EngineOptions,
    request: &TransformRequest,
) -> Result<BatchSummary, EngineError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    // The engine owns the only sender; dropping it ends the printer loop
    let result = BatchTransformEngine::new(options).with_events(tx).run(request);
    if printer.join().is_err() {
        log::warn!("progress printer thread panicked");
    }
    result
}
