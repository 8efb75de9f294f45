//! Application configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML value, the user file is merged on top of them, and the
//! merged value is deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [style.margins]           # percent of the photo's own axis
//! top = 10.0
//! right = 10.0
//! bottom = 25.0
//! left = 10.0
//!
//! [style.background]
//! mode = "solid"            # solid | translucent_image | blurred_image
//! color = "#fff"
//!
//! [schedule]
//! throttle_ms = 250         # style edits: at most one recompute per interval
//! debounce_ms = 250         # resizes: recompute after this much quiet
//!
//! [limits]
//! new_block = 5             # cap when adding a text block
//! duplicate_block = 6       # cap when duplicating one
//!
//! [container]
//! width = 1000.0            # viewport the CLI lays out into
//! height = 800.0
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [style.background]
//! mode = "blurred_image"
//! blur_clear = 20.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::geometry::ContainerSize;
use crate::overlay::{BlockLimits, is_known_font};
use crate::schedule::ScheduleConfig;
use crate::style::StyleOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Starting style for every layout and preview.
    pub style: StyleOptions,
    /// Recompute intervals for the editing session.
    pub schedule: ScheduleConfig,
    /// Text block caps.
    pub limits: BlockLimits,
    /// Default viewport for the CLI.
    pub container: ContainerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
        }
    }
}

impl ContainerConfig {
    pub fn size(&self) -> ContainerSize {
        ContainerSize::new(self.width, self.height)
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.style
            .validate()
            .map_err(|e| ConfigError::Validation(format!("style: {e}")))?;
        for (i, block) in self.style.text_blocks.iter().enumerate() {
            let family = block.font_family.as_str();
            if !is_known_font(family) {
                return Err(ConfigError::Validation(format!(
                    "style.text_blocks.{i}.font_family: unknown font '{family}'"
                )));
            }
        }
        if self.limits.new_block == 0 || self.limits.duplicate_block == 0 {
            return Err(ConfigError::Validation(
                "limits must be at least 1".into(),
            ));
        }
        if self.schedule.throttle_ms == 0 {
            return Err(ConfigError::Validation(
                "schedule.throttle_ms must be non-zero".into(),
            ));
        }
        if !self.container.size().is_measured() {
            return Err(ConfigError::Validation(
                "container width and height must be positive".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, on top of stock defaults.
pub fn load_config(root: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(dir = %root.display(), "config resolved");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# exif-frame configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Style: the starting point for every layout
# ---------------------------------------------------------------------------
[style]
# Corner radius of the photo, percent of its box (0-50).
radius = 0.0

# Border around the photo. Left/right are percent of the photo width,
# top/bottom percent of its height (0-200).
[style.margins]
top = 10.0
right = 10.0
bottom = 25.0
left = 10.0

[style.background]
# solid | translucent_image | blurred_image
mode = "solid"
color = "#fff"
# Opacity of the image layer, 0-100 (image modes only).
opacity = 10.0
# Blur radius in pixels (blurred_image only).
blur = 15.0
# Oversize the blurred layer by this percent to push its soft edges
# off-canvas.
# blur_clear = 0.0
# cover | contain | custom
# size = "cover"
# size_percent = 100.0     # custom only, 1-1000
# position_x = 50.0        # percent, 0-100
# position_y = 50.0

# Drop shadow under the photo, in raw pixels. Not scaled with the canvas.
[style.shadow]
offset_x = 0.0
offset_y = 0.0
blur = 0.0
spread = 0.0
color = "rgb(0, 0, 0)"

# Text blocks may be preset here. Position is percent of the canvas.
# [[style.text_blocks]]
# source = "freeform"      # metadata | freeform
# content = "Kyoto, 2024"  # a string, or a list of items for metadata
# top = 90.0
# left = 5.0
# font_size = 30.0
# color = "#333"
# font_weight = 400
# italic = false
# font_family = "unset"    # or one of the bundled font ids
# item_spacing = 12.0      # thousandths of the canvas width

# ---------------------------------------------------------------------------
# Recompute scheduling
# ---------------------------------------------------------------------------
[schedule]
# Style edits recompute at most once per interval (leading + trailing edge).
throttle_ms = 250
# Resizes recompute once the container has been still this long.
debounce_ms = 250

# ---------------------------------------------------------------------------
# Text block limits
# ---------------------------------------------------------------------------
[limits]
new_block = 5
duplicate_block = 6

# ---------------------------------------------------------------------------
# Default viewport for `layout` and `preview`
# ---------------------------------------------------------------------------
[container]
width = 1000.0
height = 800.0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::BackgroundMode;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.schedule.throttle_ms, 250);
        assert_eq!(config.schedule.debounce_ms, 250);
        assert_eq!(config.limits.new_block, 5);
        assert_eq!(config.limits.duplicate_block, 6);
        assert_eq!(config.container.size(), ContainerSize::new(1000.0, 800.0));
        assert_eq!(config.style, StyleOptions::default());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
[style.background]
mode = "blurred_image"
blur_clear = 20.0
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.style.background.mode, BackgroundMode::BlurredImage);
        assert_eq!(config.style.background.blur_clear, Some(20.0));
        assert_eq!(config.style.margins.bottom, 25.0);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[style.margins]
bottom = 40.0

[limits]
new_block = 3

[container]
width = 640.0
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.style.margins.bottom, 40.0);
        // Unspecified values should be defaults
        assert_eq!(config.style.margins.top, 10.0);
        assert_eq!(config.limits.new_block, 3);
        assert_eq!(config.limits.duplicate_block, 6);
        assert_eq!(config.container.width, 640.0);
        assert_eq!(config.container.height, 800.0);
    }

    #[test]
    fn load_config_with_text_blocks() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[[style.text_blocks]]
source = "freeform"
content = "Kyoto"
top = 90.0

[[style.text_blocks]]
content = ["ISO200", "f/4"]
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.style.text_blocks.len(), 2);
        assert_eq!(config.style.text_blocks[0].top, 90.0);
        assert_eq!(config.style.text_blocks[1].left, 40.0);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn out_of_range_margin_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[style.margins]\nleft = 250.0\n",
        )
        .unwrap();

        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("margins.left"));
    }

    #[test]
    fn unknown_font_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[[style.text_blocks]]\nfont_family = \"comic_sans\"\n",
        )
        .unwrap();

        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("comic_sans"));
    }

    #[test]
    fn zero_limit_rejected() {
        let mut config = AppConfig::default();
        config.limits.new_block = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_container_rejected() {
        let mut config = AppConfig::default();
        config.container.height = 0.0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[schedule]
throttle_ms = 250
debounce_ms = 250
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[schedule]\ndebounce_ms = 100\n").unwrap();
        let merged = merge_toml(base, overlay);
        let schedule = merged.get("schedule").unwrap();
        assert_eq!(schedule.get("debounce_ms").unwrap().as_integer(), Some(100));
        assert_eq!(schedule.get("throttle_ms").unwrap().as_integer(), Some(250));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("items = [1, 2, 3]").unwrap();
        let overlay: toml::Value = toml::from_str("items = [9]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("items").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value =
            toml::from_str("[style.background]\ncolor = \"#222\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let bg = merged.get("style").unwrap().get("background").unwrap();
        assert_eq!(bg.get("color").unwrap().as_str(), Some("#222"));
        assert_eq!(bg.get("mode").unwrap().as_str(), Some("solid"));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[limits]\nnew_blocks = 2\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[styles]\nradius = 2.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[style.shadow]\nblurr = 4.0\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn stock_defaults_round_trip() {
        let value = stock_defaults_value().unwrap();
        let config: AppConfig = value.try_into().unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
