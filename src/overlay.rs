//! Text overlay placement and block list editing.
//!
//! Block positions are stored as percentages of the canvas and resolved to
//! pixels on every layout change, so a resize never touches stored values.
//! The list-editing functions follow the style model's contract: each takes a
//! snapshot and returns a new one.

use crate::geometry::{Size, round_to};
use crate::style::{StyleOptions, TextBlock, TextContent, TextSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gap between sequence items, in thousandths of the canvas width.
pub const DEFAULT_ITEM_SPACING: f64 = 12.0;

/// Font ids the renderer knows how to embed. `unset` means the page default.
pub const FONT_FAMILIES: &[&str] = &[
    "unset",
    "deyihei",
    "hutu",
    "hanchan",
    "pangmen",
    "pangpang",
    "bifeng",
    "fengyuan",
    "yinxiong",
    "ximai",
    "harmony",
    "en_ddin",
    "en_harmony",
    "en_krone",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("at most {limit} text blocks can be added")]
    LimitReached { limit: usize },
    #[error("text block content must not be empty")]
    EmptyContent,
    #[error("text block {index} does not exist ({len} blocks)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("block has no measured size; position it manually")]
    Unmeasured,
}

/// Caps on the number of text blocks.
///
/// Adding a fresh block and duplicating an existing one are capped
/// separately; the two limits are independent settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockLimits {
    pub new_block: usize,
    pub duplicate_block: usize,
}

impl Default for BlockLimits {
    fn default() -> Self {
        Self {
            new_block: 5,
            duplicate_block: 6,
        }
    }
}

/// What the user picked in the "new text" dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDraft {
    pub source: TextSource,
    pub content: TextContent,
}

impl BlockDraft {
    pub fn metadata(items: Vec<String>) -> Self {
        Self {
            source: TextSource::Metadata,
            content: TextContent::Sequence(items),
        }
    }

    pub fn freeform(text: impl Into<String>) -> Self {
        Self {
            source: TextSource::Freeform,
            content: TextContent::Single(text.into()),
        }
    }
}

/// Result of a successful add.
#[derive(Debug, Clone)]
pub struct Added {
    pub style: StyleOptions,
    /// Position of the new block in the list.
    pub index: usize,
    /// True when other blocks already existed; an accordion-style list should
    /// collapse them and expand only the new one.
    pub expand: bool,
}

/// Pixel position of a block's top-left corner inside the canvas.
pub fn resolve_position(block: &TextBlock, canvas: Size) -> (f64, f64) {
    (
        block.left * canvas.width / 100.0,
        block.top * canvas.height / 100.0,
    )
}

/// Trailing gap after each item of a sequence block, in pixels.
///
/// Applied after every item including the last; the trailing gap is invisible.
pub fn item_spacing_px(block: &TextBlock, canvas: Size) -> f64 {
    block.item_spacing.unwrap_or(DEFAULT_ITEM_SPACING) * canvas.width / 1000.0
}

/// Percentage offset that centers a block of `block_px` on an axis of `axis_px`.
///
/// Rounded to one decimal. The block size must come from a real measurement
/// of the rendered text.
pub fn center_block(block_px: f64, axis_px: f64) -> Result<f64, OverlayError> {
    if block_px == 0.0 || !block_px.is_finite() || axis_px <= 0.0 || !axis_px.is_finite() {
        return Err(OverlayError::Unmeasured);
    }
    Ok(round_to((axis_px - block_px) / 2.0 / axis_px * 100.0, 1))
}

/// Center block `index` vertically, given its measured height.
pub fn center_vertically(
    style: &StyleOptions,
    index: usize,
    measured_height: f64,
    canvas: Size,
) -> Result<StyleOptions, OverlayError> {
    let top = center_block(measured_height, canvas.height)?;
    update_block(style, index, |block| block.top = top)
}

/// Center block `index` horizontally, given its measured width.
pub fn center_horizontally(
    style: &StyleOptions,
    index: usize,
    measured_width: f64,
    canvas: Size,
) -> Result<StyleOptions, OverlayError> {
    let left = center_block(measured_width, canvas.width)?;
    update_block(style, index, |block| block.left = left)
}

fn build_block(template: &TextBlock, draft: BlockDraft) -> TextBlock {
    let mut block = TextBlock {
        source: draft.source,
        content: draft.content,
        ..template.clone()
    };
    if block.source == TextSource::Metadata {
        block.item_spacing = Some(DEFAULT_ITEM_SPACING);
    }
    block
}

fn push_block(
    style: &StyleOptions,
    template: &TextBlock,
    draft: BlockDraft,
    limit: usize,
) -> Result<Added, OverlayError> {
    let len = style.text_blocks.len();
    if len >= limit {
        tracing::info!(limit, "text block limit reached");
        return Err(OverlayError::LimitReached { limit });
    }
    if draft.content.is_empty() {
        return Err(OverlayError::EmptyContent);
    }

    let mut blocks = style.text_blocks.as_ref().clone();
    blocks.push(build_block(template, draft));
    tracing::debug!(index = len, "text block added");

    Ok(Added {
        style: style.with_text_blocks(blocks),
        index: len,
        expand: len > 0,
    })
}

/// Append a block built from the default block style.
pub fn add_block(
    style: &StyleOptions,
    draft: BlockDraft,
    limit: usize,
) -> Result<Added, OverlayError> {
    push_block(style, &TextBlock::default(), draft, limit)
}

/// Append a block that copies the styling of block `source_index` but takes
/// its source and content from `draft`.
pub fn duplicate_block(
    style: &StyleOptions,
    source_index: usize,
    draft: BlockDraft,
    limit: usize,
) -> Result<Added, OverlayError> {
    let template = style
        .text_blocks
        .get(source_index)
        .ok_or(OverlayError::IndexOutOfRange {
            index: source_index,
            len: style.text_blocks.len(),
        })?;
    push_block(style, template, draft, limit)
}

/// Replace block `index` wholesale.
pub fn replace_block(
    style: &StyleOptions,
    index: usize,
    block: TextBlock,
) -> Result<StyleOptions, OverlayError> {
    update_block(style, index, move |slot| *slot = block)
}

/// Remove block `index`; later blocks shift down by one.
pub fn remove_block(style: &StyleOptions, index: usize) -> Result<StyleOptions, OverlayError> {
    let len = style.text_blocks.len();
    if index >= len {
        return Err(OverlayError::IndexOutOfRange { index, len });
    }
    let mut blocks = style.text_blocks.as_ref().clone();
    blocks.remove(index);
    Ok(style.with_text_blocks(blocks))
}

fn update_block(
    style: &StyleOptions,
    index: usize,
    edit: impl FnOnce(&mut TextBlock),
) -> Result<StyleOptions, OverlayError> {
    let len = style.text_blocks.len();
    if index >= len {
        return Err(OverlayError::IndexOutOfRange { index, len });
    }
    let mut blocks = style.text_blocks.as_ref().clone();
    edit(&mut blocks[index]);
    Ok(style.with_text_blocks(blocks))
}

/// Distinct font ids used by the blocks, in first-use order, without `unset`.
pub fn fonts_in_use(style: &StyleOptions) -> Vec<String> {
    let mut fonts: Vec<String> = Vec::new();
    for block in style.text_blocks.iter() {
        let family = block.font_family.as_str();
        if !family.is_empty() && family != "unset" && !fonts.iter().any(|f| f == family) {
            fonts.push(family.to_string());
        }
    }
    fonts
}

pub fn is_known_font(id: &str) -> bool {
    FONT_FAMILIES.contains(&id)
}

/// Short label for list displays: sequence items joined with `_`.
pub fn block_label(block: &TextBlock) -> String {
    match &block.content {
        TextContent::Single(text) => text.clone(),
        TextContent::Sequence(items) => items.join("_"),
    }
}
