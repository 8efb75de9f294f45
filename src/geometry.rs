//! Layout geometry: from photo size, container size and style to absolute
//! positions.
//!
//! Everything here is a pure function of its arguments. The single entry point
//! is [`compute_layout`]; the helpers are public because the renderer and the
//! tests use them directly.
//!
//! ## The scale factor
//!
//! Margins are resolved in the photo's own pixel space first, producing the
//! "final" export size (photo plus margins). One scalar then maps that pixel
//! space onto the container:
//!
//! ```text
//! scale  = max(final.w / container.w, final.h / container.h)
//! canvas = final / scale
//! ```
//!
//! The larger ratio wins, so the constraining axis fills the container exactly
//! and the other axis fits inside it. Photo size and margins are divided by the
//! same scalar. The drop shadow is not: it is applied at its raw CSS pixel
//! magnitude whatever the scale.

use crate::style::{BackgroundMode, Margins, ShadowStyle, SizeMode, StyleOptions};
use serde::{Deserialize, Serialize};

/// Natural pixel size of the source photo, orientation already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Apply an EXIF orientation code. Codes 5–8 rotate by 90° or 270°, so the
    /// stored width and height are swapped.
    pub fn oriented(width: u32, height: u32, orientation: Option<u16>) -> Self {
        match orientation {
            Some(code) if code > 4 => Self::new(height, width),
            _ => Self::new(width, height),
        }
    }

    /// True when either axis is zero: there is nothing to lay out.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Size of the viewport the canvas must fit into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A container that has not been laid out yet reports zero (or garbage).
    pub fn is_measured(&self) -> bool {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        ok(self.width) && ok(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Margins resolved to whole pixels of the source photo.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarginsPx {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// The photo's box inside the canvas, in canvas pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageRect {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
    pub right: f64,
    /// Corner radius as a percentage of the photo's own box.
    pub corner_radius: Option<f64>,
    /// Present only when the style's shadow draws something. Unscaled.
    pub shadow: Option<ShadowStyle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundSize {
    Cover,
    Contain,
    Percent(f64),
}

/// Oversizing of the background layer that pushes blurred edges off-canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bleed {
    /// Layer width and height, percent of the canvas (e.g. 120).
    pub size_percent: f64,
    /// Layer left and top offset, percent of the canvas (e.g. -10).
    pub offset_percent: f64,
}

/// Geometry of the image-backed background layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundLayer {
    pub size: BackgroundSize,
    /// 0–1, rounded to two decimals.
    pub opacity: Option<f64>,
    /// Gaussian blur radius in pixels; blurred mode only.
    pub blur: Option<f64>,
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub bleed: Option<Bleed>,
}

/// Everything the renderer needs to place the photo. Recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedLayout {
    pub canvas: Size,
    pub image: ImageRect,
    pub background: Option<BackgroundLayer>,
    pub scale: f64,
}

impl DerivedLayout {
    /// The all-zero layout returned when inputs are not usable yet.
    pub fn degenerate() -> Self {
        Self::default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.scale == 0.0
    }
}

/// Round to a fixed number of decimals.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Resolve percentage margins against the photo's own axes, floored to whole pixels.
pub fn margins_px(image: ImageDimensions, margins: &Margins) -> MarginsPx {
    let base_x = image.width as f64 / 100.0;
    let base_y = image.height as f64 / 100.0;
    MarginsPx {
        top: (base_y * margins.top).floor(),
        right: (base_x * margins.right).floor(),
        bottom: (base_y * margins.bottom).floor(),
        left: (base_x * margins.left).floor(),
    }
}

/// Photo size plus margins, in source pixels.
pub fn final_pixel_size(image: ImageDimensions, margins: &MarginsPx) -> Size {
    Size {
        width: image.width as f64 + margins.left + margins.right,
        height: image.height as f64 + margins.top + margins.bottom,
    }
}

/// The scalar that maps `content` onto `container` along its constraining axis.
pub fn scale_factor(content: Size, container: ContainerSize) -> f64 {
    (content.width / container.width).max(content.height / container.height)
}

/// Derive the background layer for image-backed modes; `None` for solid fills.
pub fn background_layer(style: &StyleOptions) -> Option<BackgroundLayer> {
    let bg = &style.background;
    if bg.mode == BackgroundMode::Solid {
        return None;
    }

    let size = match bg.size.unwrap_or_default() {
        SizeMode::Cover => BackgroundSize::Cover,
        SizeMode::Contain => BackgroundSize::Contain,
        SizeMode::Custom => BackgroundSize::Percent(bg.size_percent.unwrap_or(100.0)),
    };

    let blur = match bg.mode {
        BackgroundMode::BlurredImage => bg.blur,
        _ => None,
    };

    let bleed = bg.blur_clear.filter(|&c| c != 0.0).map(|c| Bleed {
        size_percent: 100.0 + c,
        offset_percent: -(c / 2.0),
    });

    Some(BackgroundLayer {
        size,
        opacity: bg.opacity.map(|o| round_to(o / 100.0, 2)),
        blur,
        anchor_x: bg.position_x.unwrap_or(50.0),
        anchor_y: bg.position_y.unwrap_or(50.0),
        bleed,
    })
}

/// Compute the full layout for one photo in one container.
///
/// Returns [`DerivedLayout::degenerate`] when the container has not been
/// measured or the photo has no pixel size. Style values are not validated.
pub fn compute_layout(
    container: ContainerSize,
    image: ImageDimensions,
    style: &StyleOptions,
) -> DerivedLayout {
    if !container.is_measured() || image.is_empty() {
        tracing::debug!(?container, ?image, "layout skipped: inputs not measured");
        return DerivedLayout::degenerate();
    }

    let margins = margins_px(image, &style.margins);
    let final_size = final_pixel_size(image, &margins);
    let scale = scale_factor(final_size, container);

    let canvas = Size {
        width: final_size.width / scale,
        height: final_size.height / scale,
    };

    let image_rect = ImageRect {
        width: image.width as f64 / scale,
        height: image.height as f64 / scale,
        left: margins.left / scale,
        top: margins.top / scale,
        bottom: margins.bottom / scale,
        right: margins.right / scale,
        corner_radius: style.radius,
        shadow: style
            .shadow
            .is_visible()
            .then(|| style.shadow.as_ref().clone()),
    };

    tracing::debug!(
        scale,
        width = canvas.width,
        height = canvas.height,
        "layout computed"
    );

    DerivedLayout {
        canvas,
        image: image_rect,
        background: background_layer(style),
        scale,
    }
}
