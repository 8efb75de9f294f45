//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! 001 DSCF0042.jpg (6000 x 4000)
//!     Camera make: FUJIFILM
//!     ISO: ISO400
//!     Shutter speed: 1/250s
//! 002 scan.png (800 x 600)
//!     No camera metadata (dimensions only)
//! 003 notes.txt
//!     Error: unrecognized image format: txt
//! ```
//!
//! ## Layout
//!
//! ```text
//! DSCF0042.jpg
//!     Canvas: 812.3 x 800.0 (scale 7.39)
//!     Image: 812.3 x 541.5 at (81.2, 54.2)
//!     Corners: 0%
//!     Shadow: none
//!     Background: blurred cover, opacity 1.00, blur 15px, bleed 120% / -10%
//!     Text blocks
//!         001 ISO400_f/2.8 at (40%, 20%)
//! ```

use crate::geometry::{BackgroundSize, DerivedLayout};
use crate::metadata::{ImageInfo, MetadataError};
use crate::overlay::block_label;
use crate::render::box_shadow;
use crate::style::StyleOptions;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Inspect
// ============================================================================

/// Format one inspected file: header with oriented size, then its fields.
pub fn format_inspect(
    index: usize,
    path: &Path,
    result: &Result<ImageInfo, MetadataError>,
) -> Vec<String> {
    let name = file_name(path);
    match result {
        Ok(info) => {
            let dims = info.dimensions();
            let mut lines = vec![format!(
                "{} {} ({} x {})",
                format_index(index),
                name,
                dims.width,
                dims.height
            )];
            if info.needs_confirmation() {
                lines.push(format!("{}No camera metadata (dimensions only)", indent(1)));
            }
            for field in info.fields() {
                lines.push(format!("{}{}: {}", indent(1), field.name, field.value));
            }
            lines
        }
        Err(e) => vec![
            format!("{} {}", format_index(index), name),
            format!("{}Error: {}", indent(1), e),
        ],
    }
}

pub fn print_inspect(index: usize, path: &Path, result: &Result<ImageInfo, MetadataError>) {
    for line in format_inspect(index, path, result) {
        println!("{}", line);
    }
}

// ============================================================================
// Layout
// ============================================================================

fn describe_background(layout: &DerivedLayout, style: &StyleOptions) -> String {
    let Some(layer) = &layout.background else {
        return format!("solid {}", style.background.color);
    };
    let size = match layer.size {
        BackgroundSize::Cover => "cover".to_string(),
        BackgroundSize::Contain => "contain".to_string(),
        BackgroundSize::Percent(p) => format!("{p}%"),
    };
    let mut parts = vec![match layer.blur {
        Some(_) => format!("blurred {size}"),
        None => format!("image {size}"),
    }];
    if let Some(opacity) = layer.opacity {
        parts.push(format!("opacity {opacity:.2}"));
    }
    if let Some(blur) = layer.blur {
        parts.push(format!("blur {blur}px"));
    }
    if let Some(bleed) = layer.bleed {
        parts.push(format!(
            "bleed {}% / {}%",
            bleed.size_percent, bleed.offset_percent
        ));
    }
    parts.join(", ")
}

/// Format a computed layout with the style it was computed from.
pub fn format_layout(path: &Path, layout: &DerivedLayout, style: &StyleOptions) -> Vec<String> {
    let mut lines = vec![file_name(path)];
    if layout.is_degenerate() {
        lines.push(format!("{}Layout not computed", indent(1)));
        return lines;
    }

    let image = &layout.image;
    lines.push(format!(
        "{}Canvas: {:.1} x {:.1} (scale {:.2})",
        indent(1),
        layout.canvas.width,
        layout.canvas.height,
        layout.scale
    ));
    lines.push(format!(
        "{}Image: {:.1} x {:.1} at ({:.1}, {:.1})",
        indent(1),
        image.width,
        image.height,
        image.left,
        image.top
    ));
    lines.push(format!(
        "{}Corners: {}",
        indent(1),
        image
            .corner_radius
            .map_or_else(|| "square".to_string(), |r| format!("{r}%"))
    ));
    lines.push(format!(
        "{}Shadow: {}",
        indent(1),
        image
            .shadow
            .as_ref()
            .map_or_else(|| "none".to_string(), box_shadow)
    ));
    lines.push(format!(
        "{}Background: {}",
        indent(1),
        describe_background(layout, style)
    ));

    if !style.text_blocks.is_empty() {
        lines.push(format!("{}Text blocks", indent(1)));
        for (i, block) in style.text_blocks.iter().enumerate() {
            lines.push(format!(
                "{}{} {} at ({}%, {}%)",
                indent(2),
                format_index(i + 1),
                block_label(block),
                block.left,
                block.top
            ));
        }
    }
    lines
}

pub fn print_layout(path: &Path, layout: &DerivedLayout, style: &StyleOptions) {
    for line in format_layout(path, layout, style) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
