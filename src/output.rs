//! CLI output formatting for `apply` and `check`.
//!
//! # Information-First Display
//!
//! The header line names the photo and its size; everything the compositor
//! decided is shown as indented context lines underneath, one layer per
//! line with its draws indented one level further. Skipped layers say why.
//!
//! # Output Format
//!
//! ## Apply
//!
//! ```text
//! beach.jpg (1000x800) → beach-marked.jpg
//!     Text: 576x480 at 480px
//!         001 center (212, 160)
//!     Image: skipped (marker unavailable)
//! ```
//!
//! ## Check
//!
//! ```text
//! watermark.toml
//!     Threshold: wider than 0 or taller than 0
//!     Text: "© 2024" 60% opacity 0.4 → center
//!     Image: disabled
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::compositor::Report;
use crate::config::{LayerSettings, WatermarkSettings};
use crate::imaging::{LayerOutcome, SkipReason};
use crate::types::{Anchor, Point};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn describe_skip(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::BelowThreshold => "below size threshold",
        SkipReason::Disabled => "disabled",
        SkipReason::EmptyText => "no text",
        SkipReason::ImageUnavailable => "marker unavailable",
        SkipReason::BudgetTooSmall => "does not fit",
        SkipReason::NoVisibleExtent => "nothing visible",
        SkipReason::ZeroFittedSize => "fits to zero size",
    }
}

fn anchor_list(anchors: &[Anchor]) -> String {
    anchors
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format one layer outcome: a summary line plus one line per draw.
///
/// Draw positions are paired with the configured anchors in order.
fn layer_lines(label: &str, outcome: &LayerOutcome, anchors: &[Anchor]) -> Vec<String> {
    match outcome {
        LayerOutcome::Skipped { reason } => {
            vec![format!("{}{}: skipped ({})", indent(1), label, describe_skip(*reason))]
        }
        LayerOutcome::Drawn {
            size,
            positions,
            font_size,
            rotation_fallback,
        } => {
            let mut header = format!("{}{}: {}", indent(1), label, size);
            if let Some(px) = font_size {
                header.push_str(&format!(" at {}px", px));
            }
            if *rotation_fallback {
                header.push_str(" (unrotated)");
            }
            let mut lines = vec![header];
            for (idx, (at, anchor)) in positions.iter().zip(anchors).enumerate() {
                lines.push(draw_line(idx + 1, *anchor, *at));
            }
            lines
        }
    }
}

fn draw_line(index: usize, anchor: Anchor, at: Point) -> String {
    format!("{}{} {} {}", indent(2), format_index(index), anchor, at)
}

/// Format the result of watermarking one file.
pub fn format_apply_output(
    input: &Path,
    output: &Path,
    report: &Report,
    settings: &WatermarkSettings,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}) → {}",
        input.display(),
        report.source,
        output.display()
    )];

    if report.passthrough {
        lines.push(format!("{}Below size threshold, copied unchanged", indent(1)));
        return lines;
    }

    lines.extend(layer_lines("Text", &report.text, &settings.text.placement.anchors));
    lines.extend(layer_lines("Image", &report.image, &settings.image.placement.anchors));
    lines
}

pub fn print_apply_output(
    input: &Path,
    output: &Path,
    report: &Report,
    settings: &WatermarkSettings,
) {
    for line in format_apply_output(input, output, report, settings) {
        println!("{}", line);
    }
}

fn placement_summary(placement: &LayerSettings) -> String {
    format!(
        "{}% opacity {} → {}",
        placement.size_percent,
        placement.opacity,
        anchor_list(&placement.anchors)
    )
}

/// Format a validated config: thresholds and one line per layer.
pub fn format_check_output(source: Option<&Path>, settings: &WatermarkSettings) -> Vec<String> {
    let mut lines = vec![match source {
        Some(path) => path.display().to_string(),
        None => "stock defaults".to_string(),
    }];

    lines.push(format!(
        "{}Threshold: wider than {} or taller than {}",
        indent(1),
        settings.min_width,
        settings.min_height
    ));

    let text = &settings.text;
    if text.enabled {
        let mut line = format!(
            "{}Text: {:?} {}",
            indent(1),
            text.content,
            placement_summary(&text.placement)
        );
        if text.rotation != 0 {
            line.push_str(&format!(" rotated {}°", text.rotation));
        }
        lines.push(line);
        lines.push(format!("{}Font: {}", indent(2), text.font));
    } else {
        lines.push(format!("{}Text: disabled", indent(1)));
    }

    let image = &settings.image;
    if image.enabled {
        let mut line = format!(
            "{}Image: {}",
            indent(1),
            placement_summary(&image.placement)
        );
        if image.rotation != 0 {
            line.push_str(&format!(" rotated {}°", image.rotation));
        }
        lines.push(line);
        lines.push(format!("{}Source: {}", indent(2), image.path.display()));
    } else {
        lines.push(format!("{}Image: disabled", indent(1)));
    }

    lines
}

pub fn print_check_output(source: Option<&Path>, settings: &WatermarkSettings) {
    for line in format_check_output(source, settings) {
        println!("{}", line);
    }
}
