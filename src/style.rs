//! User-editable style options.
//!
//! A [`StyleOptions`] value is an immutable snapshot. Editing never mutates a
//! snapshot in place: [`StyleOptions::patch`] returns a new snapshot with one
//! field replaced, and the snapshot it was derived from stays valid.
//!
//! ## Structural sharing
//!
//! The three larger sub-trees (`background`, `shadow`, `text_blocks`) live
//! behind [`Arc`]. Cloning a snapshot clones three pointers; patching a field
//! copies only the sub-tree that contains it (`Arc::make_mut`). A patch on
//! `background.opacity` therefore leaves the new snapshot sharing its shadow
//! and text blocks with the old one.
//!
//! ## Paths
//!
//! Patches address fields with dotted paths:
//!
//! ```text
//! margins.top              background.opacity        shadow.color
//! radius                   background.mode           text_blocks.2.left
//! text_blocks.0.content    text_blocks.0.shadow      text_blocks.0.shadow.blur
//! ```
//!
//! Values are [`toml::Value`]s so the same path/value pairs can come from a
//! config file, a CLI flag, or an editing surface.
//!
//! ## Ranges
//!
//! The layout engine accepts any numeric value. [`StyleOptions::validate`]
//! exists for input surfaces that want to reject out-of-range values before
//! they reach a snapshot; nothing in the engine calls it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("unknown style path: {0}")]
    UnknownPath(String),
    #[error("invalid value for {path}: expected {expected}")]
    InvalidValue {
        path: String,
        expected: &'static str,
    },
    #[error("text block {index} does not exist ({len} blocks)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0}")]
    OutOfRange(String),
}

/// Complete set of user-editable options for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleOptions {
    /// Border space around the photo, in percent of the photo's own axis.
    pub margins: Margins,
    /// Corner radius in percent of the photo's box. `None` renders square corners.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    pub background: Arc<BackgroundStyle>,
    pub shadow: Arc<ShadowStyle>,
    pub text_blocks: Arc<Vec<TextBlock>>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            radius: Some(0.0),
            background: Arc::new(BackgroundStyle::default()),
            shadow: Arc::new(ShadowStyle::default()),
            text_blocks: Arc::new(Vec::new()),
        }
    }
}

/// Margins in percent: left/right relative to the photo width, top/bottom
/// relative to its height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 10.0,
            bottom: 25.0,
            left: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Flat colour fill.
    #[default]
    Solid,
    /// The photo itself, faded, behind the canvas.
    TranslucentImage,
    /// The photo itself, blurred ("frosted glass").
    BlurredImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    #[default]
    Cover,
    Contain,
    /// Explicit percentage, taken from [`BackgroundStyle::size_percent`].
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundStyle {
    pub mode: BackgroundMode,
    /// Canvas fill colour, shown directly in solid mode and under the image otherwise.
    pub color: String,
    /// Image layer opacity, 0–100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Blur radius in pixels (blurred mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    /// Blur-edge compensation in percent: the layer is oversized by this much
    /// so its blurred edges fall outside the canvas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_clear: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self {
            mode: BackgroundMode::Solid,
            color: "#fff".to_string(),
            opacity: Some(10.0),
            blur: Some(15.0),
            blur_clear: None,
            size: None,
            size_percent: None,
            position_x: None,
            position_y: None,
        }
    }
}

/// Drop shadow under the photo, in raw CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowStyle {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub spread: f64,
    pub color: String,
}

impl ShadowStyle {
    /// A shadow with zero offset, blur and spread draws nothing.
    pub fn is_visible(&self) -> bool {
        self.offset_x != 0.0 || self.offset_y != 0.0 || self.blur != 0.0 || self.spread != 0.0
    }
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            spread: 0.0,
            color: "rgb(0, 0, 0)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Picked from the photo's camera metadata; usually several items.
    #[default]
    Metadata,
    /// Typed by the user.
    Freeform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Single(String),
    Sequence(Vec<String>),
}

impl TextContent {
    pub fn is_empty(&self) -> bool {
        match self {
            TextContent::Single(s) => s.is_empty(),
            TextContent::Sequence(items) => items.is_empty(),
        }
    }
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent::Sequence(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextShadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: String,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: "#000".to_string(),
        }
    }
}

/// One positioned text overlay. Position is in percent of the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextBlock {
    pub source: TextSource,
    pub content: TextContent,
    pub top: f64,
    pub left: f64,
    pub font_size: f64,
    pub color: String,
    pub font_weight: u32,
    pub italic: bool,
    pub font_family: String,
    /// Gap after each item of a sequence, in thousandths of the canvas width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<TextShadow>,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            source: TextSource::Metadata,
            content: TextContent::default(),
            top: 20.0,
            left: 40.0,
            font_size: 30.0,
            color: "red".to_string(),
            font_weight: 400,
            italic: false,
            font_family: "unset".to_string(),
            item_spacing: None,
            shadow: None,
        }
    }
}

// =============================================================================
// Patching
// =============================================================================

fn decode<T: DeserializeOwned>(
    path: &str,
    value: toml::Value,
    expected: &'static str,
) -> Result<T, StyleError> {
    value.try_into().map_err(|_| StyleError::InvalidValue {
        path: path.to_string(),
        expected,
    })
}

impl StyleOptions {
    /// Return a new snapshot with the field at `path` replaced by `value`.
    ///
    /// `self` is left untouched whether or not the patch succeeds.
    pub fn patch(&self, path: &str, value: toml::Value) -> Result<Self, StyleError> {
        let mut next = self.clone();
        let segments: Vec<&str> = path.split('.').collect();

        match segments.as_slice() {
            ["margins", field] => next.margins.set(field, path, value)?,
            ["radius"] => next.radius = Some(decode(path, value, "a number")?),
            ["background", field] => Arc::make_mut(&mut next.background).set(field, path, value)?,
            ["shadow", field] => Arc::make_mut(&mut next.shadow).set(field, path, value)?,
            ["text_blocks", index, rest @ ..] if !rest.is_empty() => {
                let index: usize = index
                    .parse()
                    .map_err(|_| StyleError::UnknownPath(path.to_string()))?;
                let len = next.text_blocks.len();
                let blocks = Arc::make_mut(&mut next.text_blocks);
                let block = blocks
                    .get_mut(index)
                    .ok_or(StyleError::IndexOutOfRange { index, len })?;
                block.set(rest, path, value)?;
            }
            _ => return Err(StyleError::UnknownPath(path.to_string())),
        }

        Ok(next)
    }

    /// Apply several patches as one edit. Either all apply or none do.
    pub fn patch_all<'a, I>(&self, patches: I) -> Result<Self, StyleError>
    where
        I: IntoIterator<Item = (&'a str, toml::Value)>,
    {
        patches
            .into_iter()
            .try_fold(self.clone(), |style, (path, value)| style.patch(path, value))
    }

    /// Switch background mode. Entering blurred mode resets opacity to 100,
    /// since a faded blur is rarely what anyone wants.
    pub fn with_background_mode(&self, mode: BackgroundMode) -> Self {
        let mut next = self.clone();
        let background = Arc::make_mut(&mut next.background);
        background.mode = mode;
        if mode == BackgroundMode::BlurredImage {
            background.opacity = Some(100.0);
        }
        next
    }

    /// Switch background sizing. Entering custom sizing starts at 100%.
    pub fn with_background_size(&self, size: SizeMode) -> Self {
        let mut next = self.clone();
        let background = Arc::make_mut(&mut next.background);
        background.size = Some(size);
        if size == SizeMode::Custom {
            background.size_percent = Some(100.0);
        }
        next
    }

    /// Replace the whole text block list.
    pub fn with_text_blocks(&self, blocks: Vec<TextBlock>) -> Self {
        Self {
            text_blocks: Arc::new(blocks),
            ..self.clone()
        }
    }

    /// Check every value against the range its editing control allows.
    pub fn validate(&self) -> Result<(), StyleError> {
        let m = &self.margins;
        for (name, v) in [
            ("top", m.top),
            ("right", m.right),
            ("bottom", m.bottom),
            ("left", m.left),
        ] {
            check_range(&format!("margins.{name}"), v, 0.0, 200.0)?;
        }
        if let Some(radius) = self.radius {
            check_range("radius", radius, 0.0, 50.0)?;
        }
        let bg = &self.background;
        if let Some(opacity) = bg.opacity {
            check_range("background.opacity", opacity, 0.0, 100.0)?;
        }
        if let Some(size) = bg.size_percent {
            check_range("background.size_percent", size, 1.0, 1000.0)?;
        }
        if let Some(x) = bg.position_x {
            check_range("background.position_x", x, 0.0, 100.0)?;
        }
        if let Some(y) = bg.position_y {
            check_range("background.position_y", y, 0.0, 100.0)?;
        }
        for (i, block) in self.text_blocks.iter().enumerate() {
            check_range(&format!("text_blocks.{i}.top"), block.top, 0.0, 100.0)?;
            check_range(&format!("text_blocks.{i}.left"), block.left, 0.0, 100.0)?;
        }
        Ok(())
    }
}

fn check_range(path: &str, value: f64, min: f64, max: f64) -> Result<(), StyleError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(StyleError::OutOfRange(format!(
            "{path} must be {min}-{max}, got {value}"
        )))
    }
}

impl Margins {
    fn set(&mut self, field: &str, path: &str, value: toml::Value) -> Result<(), StyleError> {
        let slot = match field {
            "top" => &mut self.top,
            "right" => &mut self.right,
            "bottom" => &mut self.bottom,
            "left" => &mut self.left,
            _ => return Err(StyleError::UnknownPath(path.to_string())),
        };
        *slot = decode(path, value, "a number")?;
        Ok(())
    }
}

impl BackgroundStyle {
    fn set(&mut self, field: &str, path: &str, value: toml::Value) -> Result<(), StyleError> {
        const NUM: &str = "a number";
        match field {
            "mode" => {
                self.mode = decode(path, value, "solid, translucent_image or blurred_image")?
            }
            "color" => self.color = decode(path, value, "a colour string")?,
            "opacity" => self.opacity = Some(decode(path, value, NUM)?),
            "blur" => self.blur = Some(decode(path, value, NUM)?),
            "blur_clear" => self.blur_clear = Some(decode(path, value, NUM)?),
            "size" => self.size = Some(decode(path, value, "cover, contain or custom")?),
            "size_percent" => self.size_percent = Some(decode(path, value, NUM)?),
            "position_x" => self.position_x = Some(decode(path, value, NUM)?),
            "position_y" => self.position_y = Some(decode(path, value, NUM)?),
            _ => return Err(StyleError::UnknownPath(path.to_string())),
        }
        Ok(())
    }
}

impl ShadowStyle {
    fn set(&mut self, field: &str, path: &str, value: toml::Value) -> Result<(), StyleError> {
        match field {
            "offset_x" => self.offset_x = decode(path, value, "a number")?,
            "offset_y" => self.offset_y = decode(path, value, "a number")?,
            "blur" => self.blur = decode(path, value, "a number")?,
            "spread" => self.spread = decode(path, value, "a number")?,
            "color" => self.color = decode(path, value, "a colour string")?,
            _ => return Err(StyleError::UnknownPath(path.to_string())),
        }
        Ok(())
    }
}

impl TextBlock {
    fn set(&mut self, fields: &[&str], path: &str, value: toml::Value) -> Result<(), StyleError> {
        const NUM: &str = "a number";
        match fields {
            ["source"] => self.source = decode(path, value, "metadata or freeform")?,
            ["content"] => self.content = decode(path, value, "a string or list of strings")?,
            ["top"] => self.top = decode(path, value, NUM)?,
            ["left"] => self.left = decode(path, value, NUM)?,
            ["font_size"] => self.font_size = decode(path, value, NUM)?,
            ["color"] => self.color = decode(path, value, "a colour string")?,
            ["font_weight"] => self.font_weight = decode(path, value, "an integer")?,
            ["italic"] => self.italic = decode(path, value, "a boolean")?,
            ["font_family"] => self.font_family = decode(path, value, "a font id")?,
            ["item_spacing"] => self.item_spacing = Some(decode(path, value, NUM)?),
            // A bare boolean toggles the shadow, keeping its last settings.
            ["shadow"] => {
                let enabled: bool = decode(path, value, "a boolean")?;
                self.shadow = match (enabled, self.shadow.take()) {
                    (true, existing) => Some(existing.unwrap_or_default()),
                    (false, _) => None,
                };
            }
            ["shadow", field] => {
                let shadow = self.shadow.get_or_insert_with(TextShadow::default);
                match *field {
                    "offset_x" => shadow.offset_x = decode(path, value, NUM)?,
                    "offset_y" => shadow.offset_y = decode(path, value, NUM)?,
                    "blur" => shadow.blur = decode(path, value, NUM)?,
                    "color" => shadow.color = decode(path, value, "a colour string")?,
                    _ => return Err(StyleError::UnknownPath(path.to_string())),
                }
            }
            _ => return Err(StyleError::UnknownPath(path.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn default_snapshot_values() {
        let style = StyleOptions::default();
        assert_eq!(style.margins.top, 10.0);
        assert_eq!(style.margins.right, 10.0);
        assert_eq!(style.margins.bottom, 25.0);
        assert_eq!(style.margins.left, 10.0);
        assert_eq!(style.radius, Some(0.0));
        assert_eq!(style.background.mode, BackgroundMode::Solid);
        assert_eq!(style.background.color, "#fff");
        assert_eq!(style.background.opacity, Some(10.0));
        assert_eq!(style.background.blur, Some(15.0));
        assert_eq!(style.shadow.color, "rgb(0, 0, 0)");
        assert!(!style.shadow.is_visible());
        assert!(style.text_blocks.is_empty());
    }

    #[test]
    fn default_text_block_is_base_block() {
        let block = TextBlock::default();
        assert_eq!(block.top, 20.0);
        assert_eq!(block.left, 40.0);
        assert_eq!(block.font_size, 30.0);
        assert_eq!(block.color, "red");
        assert_eq!(block.font_weight, 400);
        assert_eq!(block.font_family, "unset");
        assert!(block.shadow.is_none());
    }

    // =========================================================================
    // patch()
    // =========================================================================

    #[test]
    fn patch_nested_background_field() {
        let old = StyleOptions::default();
        let new = old.patch("background.opacity", Value::Integer(55)).unwrap();

        assert_eq!(new.background.opacity, Some(55.0));
        assert_eq!(old.background.opacity, Some(10.0));
    }

    #[test]
    fn patch_shares_untouched_subtrees() {
        let old = StyleOptions::default();
        let new = old.patch("background.blur", Value::Float(4.5)).unwrap();

        assert!(Arc::ptr_eq(&old.shadow, &new.shadow));
        assert!(Arc::ptr_eq(&old.text_blocks, &new.text_blocks));
        assert!(!Arc::ptr_eq(&old.background, &new.background));
    }

    #[test]
    fn patch_margin_and_radius() {
        let style = StyleOptions::default()
            .patch("margins.left", Value::Float(12.5))
            .unwrap()
            .patch("radius", Value::Integer(8))
            .unwrap();
        assert_eq!(style.margins.left, 12.5);
        assert_eq!(style.radius, Some(8.0));
    }

    #[test]
    fn patch_background_mode_from_string() {
        let style = StyleOptions::default()
            .patch("background.mode", Value::String("blurred_image".into()))
            .unwrap();
        assert_eq!(style.background.mode, BackgroundMode::BlurredImage);
    }

    #[test]
    fn patch_text_block_field() {
        let style = StyleOptions::default().with_text_blocks(vec![TextBlock::default()]);
        let next = style.patch("text_blocks.0.top", Value::Float(33.3)).unwrap();
        assert_eq!(next.text_blocks[0].top, 33.3);
        assert_eq!(style.text_blocks[0].top, 20.0);
    }

    #[test]
    fn patch_text_block_shadow_toggle_keeps_settings() {
        let style = StyleOptions::default().with_text_blocks(vec![TextBlock::default()]);
        let on = style.patch("text_blocks.0.shadow.blur", Value::Integer(3)).unwrap();
        assert_eq!(on.text_blocks[0].shadow.as_ref().unwrap().blur, 3.0);

        let off = on.patch("text_blocks.0.shadow", Value::Boolean(false)).unwrap();
        assert!(off.text_blocks[0].shadow.is_none());

        let back = off.patch("text_blocks.0.shadow", Value::Boolean(true)).unwrap();
        assert_eq!(back.text_blocks[0].shadow, Some(TextShadow::default()));
    }

    #[test]
    fn patch_text_block_content_accepts_list() {
        let style = StyleOptions::default().with_text_blocks(vec![TextBlock::default()]);
        let list = Value::Array(vec![Value::String("ISO100".into()), Value::String("f/2".into())]);
        let next = style.patch("text_blocks.0.content", list).unwrap();
        assert_eq!(
            next.text_blocks[0].content,
            TextContent::Sequence(vec!["ISO100".into(), "f/2".into()])
        );
    }

    #[test]
    fn patch_unknown_path_is_error() {
        let style = StyleOptions::default();
        assert_eq!(
            style.patch("background.sparkle", Value::Integer(1)),
            Err(StyleError::UnknownPath("background.sparkle".into()))
        );
        assert!(matches!(
            style.patch("nope", Value::Integer(1)),
            Err(StyleError::UnknownPath(_))
        ));
    }

    #[test]
    fn patch_wrong_type_is_error() {
        let style = StyleOptions::default();
        let result = style.patch("margins.top", Value::String("wide".into()));
        assert!(matches!(result, Err(StyleError::InvalidValue { .. })));
    }

    #[test]
    fn patch_missing_text_block_is_error() {
        let style = StyleOptions::default();
        assert_eq!(
            style.patch("text_blocks.3.top", Value::Integer(1)),
            Err(StyleError::IndexOutOfRange { index: 3, len: 0 })
        );
    }

    #[test]
    fn patch_accepts_out_of_range_numbers() {
        let style = StyleOptions::default()
            .patch("margins.top", Value::Integer(-40))
            .unwrap();
        assert_eq!(style.margins.top, -40.0);
    }

    #[test]
    fn patch_all_is_atomic() {
        let style = StyleOptions::default();
        let result = style.patch_all([
            ("background.opacity", Value::Integer(50)),
            ("background.bogus", Value::Integer(1)),
        ]);
        assert!(result.is_err());
        assert_eq!(style.background.opacity, Some(10.0));
    }

    // =========================================================================
    // Mode switches
    // =========================================================================

    #[test]
    fn switching_to_blur_sets_full_opacity() {
        let style = StyleOptions::default().with_background_mode(BackgroundMode::BlurredImage);
        assert_eq!(style.background.opacity, Some(100.0));

        let style = StyleOptions::default().with_background_mode(BackgroundMode::TranslucentImage);
        assert_eq!(style.background.opacity, Some(10.0));
    }

    #[test]
    fn switching_to_custom_size_starts_at_100() {
        let style = StyleOptions::default().with_background_size(SizeMode::Custom);
        assert_eq!(style.background.size, Some(SizeMode::Custom));
        assert_eq!(style.background.size_percent, Some(100.0));
    }

    // =========================================================================
    // validate()
    // =========================================================================

    #[test]
    fn default_snapshot_validates() {
        assert!(StyleOptions::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_large_radius() {
        let style = StyleOptions::default()
            .patch("radius", Value::Integer(60))
            .unwrap();
        assert!(matches!(style.validate(), Err(StyleError::OutOfRange(_))));
    }

    #[test]
    fn validate_rejects_margin_over_200() {
        let style = StyleOptions::default()
            .patch("margins.bottom", Value::Integer(201))
            .unwrap();
        let err = style.validate().unwrap_err();
        assert!(err.to_string().contains("margins.bottom"));
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn parse_sparse_style_toml() {
        let style: StyleOptions = toml::from_str(
            r##"
[margins]
bottom = 40

[background]
mode = "translucent_image"
size = "contain"
"##,
        )
        .unwrap();
        assert_eq!(style.margins.bottom, 40.0);
        assert_eq!(style.margins.top, 10.0);
        assert_eq!(style.background.mode, BackgroundMode::TranslucentImage);
        assert_eq!(style.background.size, Some(SizeMode::Contain));
        assert_eq!(style.background.color, "#fff");
    }

    #[test]
    fn parse_rejects_unknown_keys() {
        let result: Result<StyleOptions, _> = toml::from_str("[margins]\ncenter = 3\n");
        assert!(result.is_err());
    }
}
