//! CLI output formatting.
//!
//! Output is **source-centric**: every line starts from the file the user
//! put in the source directory, followed by what became of it.
//!
//! # Output Format
//!
//! ```text
//! Source:  /home/me/scans
//! Output:  /home/me/scans/output-web
//! Format:  webp, max 1920px, quality 80
//! Prefix:  abc123-
//!
//! Mein Bild Ü.jpg → abc123-mein-bild-ue.webp
//! Mein Bild Ü.png → abc123-mein-bild-ue-001.webp
//! brochure.pdf (3 pages)
//!     → abc123-brochure-p001.webp
//!     → abc123-brochure-p002.webp
//!     → abc123-brochure-p003.webp
//! broken.tif: FAILED failed to decode …
//!
//! Converted 3 files (5 outputs), 1 failed, 0 skipped
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>` or a single
//! line) for testability and a `print_*` wrapper that writes to stdout.
//! Format functions are pure: no I/O, no side effects.

use crate::config::RunConfig;
use crate::convert::{ConvertEvent, Outcome, RunSummary};
use crate::imaging::{Capabilities, Capability};

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
// Run header
// ============================================================================

/// Format the settings a run is about to use.
pub fn format_config(config: &RunConfig) -> Vec<String> {
    let format = config.image.format;
    let quality = if format.uses_quality() {
        format!(", quality {}", config.image.quality.value())
    } else {
        String::new()
    };
    let extensions: Vec<&str> = config.extensions.iter().map(String::as_str).collect();

    let mut lines = vec![
        format!("Source:  {}", config.source.display()),
        format!("Output:  {}", config.output.display()),
        format!("Format:  {format}, max {}px{quality}", config.image.width),
        format!("Files:   {}", extensions.join(", ")),
    ];
    if extensions.contains(&"pdf") {
        lines.push(format!("Zoom:    {}", config.zoom));
    }
    if !config.prefix.is_empty() {
        lines.push(format!("Prefix:  {}", config.prefix));
    }
    if config.dry_run {
        lines.push("Dry run: nothing will be written".to_string());
    }
    lines
}

/// Notice about how a user-supplied prefix was normalized, if worth saying.
///
/// A prefix that normalizes to nothing is ignored; one that changes is
/// echoed so the user sees what will actually be prepended.
pub fn format_prefix_notice(raw: &str, normalized: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if normalized.is_empty() {
        Some(format!(
            "Prefix '{raw}' contains no letters or digits and is ignored"
        ))
    } else if normalized.trim_end_matches('-') != raw {
        Some(format!("Prefix '{raw}' normalized to '{normalized}'"))
    } else {
        None
    }
}

// ============================================================================
// Per-file events
// ============================================================================

/// Format one source file's outcome.
///
/// Single outputs share the source line; PDFs list each page beneath it.
pub fn format_event(event: &ConvertEvent) -> Vec<String> {
    let source = event.source.display();
    match &event.outcome {
        Outcome::Converted { outputs } if outputs.len() == 1 => {
            vec![format!("{source} → {}", outputs[0])]
        }
        Outcome::Converted { outputs } => {
            let mut lines = vec![format!("{source} ({})", plural(outputs.len(), "page"))];
            lines.extend(outputs.iter().map(|o| format!("{}→ {o}", indent(1))));
            lines
        }
        Outcome::Skipped { reason } => vec![format!("{source}: skipped ({reason})")],
        Outcome::Failed { error } => vec![format!("{source}: FAILED {error}")],
    }
}

pub fn print_event(event: &ConvertEvent) {
    for line in format_event(event) {
        println!("{line}");
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-run totals.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    if summary.events.is_empty() {
        return vec![format!(
            "No matching files in {}",
            summary.source.display()
        )];
    }

    let verb = if summary.dry_run {
        "Would convert"
    } else {
        "Converted"
    };
    vec![format!(
        "{verb} {} ({}), {} failed, {} skipped",
        plural(summary.converted, "file"),
        plural(summary.written, "output"),
        summary.failed,
        summary.skipped
    )]
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    for line in format_summary(summary) {
        println!("{line}");
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Format the availability of each optional capability.
pub fn format_capabilities(capabilities: &Capabilities) -> Vec<String> {
    [Capability::AvifEncoding, Capability::PdfRendering]
        .into_iter()
        .map(|cap| {
            if capabilities.supports(cap) {
                format!("{cap}: available")
            } else {
                format!("{cap}: missing ({})", cap.hint())
            }
        })
        .collect()
}

pub fn print_capabilities(capabilities: &Capabilities) {
    for line in format_capabilities(capabilities) {
        println!("{line}");
    }
}
