//! From a derived layout to presentation attributes and a paintable document.
//!
//! The engine's output is typed geometry; this module turns it into the inline
//! CSS declarations a DOM renderer consumes, and assembles a standalone HTML
//! document of the canvas with [Maud](https://maud.lambda.xyz/).
//!
//! Serializing that document to a bitmap is somebody else's job: anything that
//! implements [`Exporter`]. [`HtmlExporter`] is the built-in one and simply
//! emits the document itself, which is what the CLI `preview` command writes.
//!
//! Style helpers return [`Declarations`] (ordered property/value pairs) so
//! tests can inspect individual properties without string matching.

use crate::geometry::{BackgroundLayer, BackgroundSize, DerivedLayout, ImageRect, Size};
use crate::overlay::{fonts_in_use, item_spacing_px, resolve_position};
use crate::style::{ShadowStyle, StyleOptions, TextBlock, TextContent, TextSource};
use maud::{DOCTYPE, Markup, html};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export failed: {0}")]
    Failed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Export failures never invalidate the session; the user may retry.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Ordered CSS declarations for one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations(Vec<(&'static str, String)>);

impl Declarations {
    fn push(&mut self, property: &'static str, value: impl Into<String>) {
        self.0.push((property, value.into()));
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// `prop: value; prop: value` for a `style` attribute.
    pub fn to_inline(&self) -> String {
        self.0
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn px(value: f64) -> String {
    format!("{value}px")
}

fn percent(value: f64) -> String {
    format!("{value}%")
}

/// `offset-x offset-y blur spread colour`, raw pixels.
pub fn box_shadow(shadow: &ShadowStyle) -> String {
    format!(
        "{}px {}px {}px {}px {}",
        shadow.offset_x, shadow.offset_y, shadow.blur, shadow.spread, shadow.color
    )
}

pub fn canvas_style(canvas: Size, style: &StyleOptions) -> Declarations {
    let mut d = Declarations::default();
    d.push("position", "relative");
    d.push("width", px(canvas.width));
    d.push("height", px(canvas.height));
    d.push("background-color", style.background.color.clone());
    d
}

pub fn image_style(rect: &ImageRect) -> Declarations {
    let mut d = Declarations::default();
    d.push("position", "absolute");
    d.push("width", px(rect.width));
    d.push("height", px(rect.height));
    d.push("left", px(rect.left));
    d.push("top", px(rect.top));
    d.push("bottom", px(rect.bottom));
    d.push("right", px(rect.right));
    d.push(
        "border-radius",
        rect.corner_radius.map_or_else(|| "0".to_string(), percent),
    );
    if let Some(shadow) = &rect.shadow {
        d.push("box-shadow", box_shadow(shadow));
    }
    d
}

/// `url("...")` with the quote and backslash escaped.
fn css_url(url: &str) -> String {
    let escaped = url.replace('\\', "\\\\").replace('"', "\\\"");
    format!("url(\"{escaped}\")")
}

pub fn background_style(layer: &BackgroundLayer, image_url: &str) -> Declarations {
    let mut d = Declarations::default();
    d.push("position", "absolute");
    d.push("background-image", css_url(image_url));
    d.push("background-repeat", "no-repeat");
    d.push(
        "background-size",
        match layer.size {
            BackgroundSize::Cover => "cover".to_string(),
            BackgroundSize::Contain => "contain".to_string(),
            BackgroundSize::Percent(p) => percent(p),
        },
    );
    if let Some(blur) = layer.blur {
        d.push("filter", format!("blur({blur}px)"));
    }
    if let Some(opacity) = layer.opacity {
        d.push("opacity", format!("{opacity:.2}"));
    }
    d.push("background-position-x", percent(layer.anchor_x));
    d.push("background-position-y", percent(layer.anchor_y));
    match layer.bleed {
        Some(bleed) => {
            d.push("width", percent(bleed.size_percent));
            d.push("height", percent(bleed.size_percent));
            d.push("left", percent(bleed.offset_percent));
            d.push("top", percent(bleed.offset_percent));
        }
        None => {
            d.push("inset", "0");
        }
    }
    d
}

pub fn text_block_style(block: &TextBlock, canvas: Size) -> Declarations {
    let (left, top) = resolve_position(block, canvas);
    let mut d = Declarations::default();
    d.push("position", "absolute");
    d.push("left", px(left));
    d.push("top", px(top));
    d.push("font-size", px(block.font_size));
    d.push("color", block.color.clone());
    d.push("white-space", "pre");
    d.push("font-weight", block.font_weight.to_string());
    d.push(
        "text-shadow",
        match &block.shadow {
            Some(s) => format!("{}px {}px {}px {}", s.offset_x, s.offset_y, s.blur, s.color),
            None => "none".to_string(),
        },
    );
    d.push(
        "font-family",
        if block.font_family.is_empty() {
            "unset".to_string()
        } else {
            block.font_family.clone()
        },
    );
    d.push("font-style", if block.italic { "italic" } else { "normal" });
    d
}

/// Style for each item of a sequence block.
pub fn item_style(block: &TextBlock, canvas: Size) -> Declarations {
    let mut d = Declarations::default();
    d.push("margin-right", px(item_spacing_px(block, canvas)));
    d
}

/// The canvas as a standalone HTML document.
pub fn render_document(layout: &DerivedLayout, style: &StyleOptions, image_url: &str) -> Markup {
    let canvas = layout.canvas;
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "exif-frame preview" }
            }
            body style="margin: 0" {
                div #image-canvas style="position: relative; overflow: hidden; display: inline-block" {
                    @if let Some(layer) = &layout.background {
                        div .canvas-bg style=(background_style(layer, image_url).to_inline()) {}
                    }
                    div .canvas-inner style=(canvas_style(canvas, style).to_inline()) {
                        img src=(image_url) style=(image_style(&layout.image).to_inline());
                        @for (index, block) in style.text_blocks.iter().enumerate() {
                            div id=(format!("text-block-{index}")) style=(text_block_style(block, canvas).to_inline()) {
                                @match (&block.source, &block.content) {
                                    (TextSource::Metadata, TextContent::Sequence(items)) => {
                                        @for item in items {
                                            span style=(item_style(block, canvas).to_inline()) { (item) }
                                        }
                                    }
                                    (_, TextContent::Sequence(items)) => { (items.join(" ")) }
                                    (_, TextContent::Single(text)) => { (text) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// What an exporter receives: the painted document plus the fonts it must embed.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub markup: String,
    pub fonts: Vec<String>,
    pub canvas: Size,
}

impl ExportRequest {
    pub fn new(layout: &DerivedLayout, style: &StyleOptions, image_url: &str) -> Self {
        Self {
            markup: render_document(layout, style, image_url).into_string(),
            fonts: fonts_in_use(style),
            canvas: layout.canvas,
        }
    }
}

/// Serializes a painted document to an image file's bytes.
pub trait Exporter {
    fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, ExportError>;
}

/// Emits the HTML document itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExporter;

impl Exporter for HtmlExporter {
    fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, ExportError> {
        Ok(request.markup.clone().into_bytes())
    }
}

/// Paint and export one layout. Degenerate layouts are refused rather than
/// exported as an empty image.
pub fn export(
    exporter: &impl Exporter,
    layout: &DerivedLayout,
    style: &StyleOptions,
    image_url: &str,
) -> Result<Vec<u8>, ExportError> {
    if layout.is_degenerate() {
        return Err(ExportError::Failed("layout has not been computed".to_string()));
    }
    let request = ExportRequest::new(layout, style, image_url);
    tracing::info!(fonts = ?request.fonts, "exporting canvas");
    exporter.export(&request).inspect_err(|e| {
        tracing::warn!(error = %e, "export failed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ContainerSize, ImageDimensions, compute_layout};
    use crate::style::{BackgroundMode, TextSource};
    use std::cell::Cell;
    use toml::Value;

    fn layout_for(style: &StyleOptions) -> DerivedLayout {
        compute_layout(
            ContainerSize::new(1000.0, 800.0),
            ImageDimensions::new(2000, 1000),
            style,
        )
    }

    fn zero_margins() -> StyleOptions {
        StyleOptions::default()
            .patch_all([
                ("margins.top", Value::Integer(0)),
                ("margins.right", Value::Integer(0)),
                ("margins.bottom", Value::Integer(0)),
                ("margins.left", Value::Integer(0)),
            ])
            .unwrap()
    }

    /// Exporter that fails a set number of times before succeeding.
    struct FlakyExporter {
        failures_left: Cell<u32>,
    }

    impl Exporter for FlakyExporter {
        fn export(&self, _request: &ExportRequest) -> Result<Vec<u8>, ExportError> {
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(ExportError::Failed("renderer crashed".into()));
            }
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    #[test]
    fn image_style_has_absolute_geometry() {
        let layout = layout_for(&zero_margins());
        let d = image_style(&layout.image);
        assert_eq!(d.get("position"), Some("absolute"));
        assert_eq!(d.get("width"), Some("1000px"));
        assert_eq!(d.get("height"), Some("500px"));
        assert_eq!(d.get("border-radius"), Some("0%"));
        assert_eq!(d.get("box-shadow"), None);
    }

    #[test]
    fn image_style_square_corners_without_radius() {
        let rect = ImageRect::default();
        assert_eq!(image_style(&rect).get("border-radius"), Some("0"));
    }

    #[test]
    fn shadow_css_uses_raw_pixels() {
        let style = zero_margins()
            .patch_all([
                ("shadow.offset_x", Value::Integer(4)),
                ("shadow.blur", Value::Integer(12)),
                ("shadow.color", Value::String("#333".into())),
            ])
            .unwrap();
        let layout = layout_for(&style);
        assert_eq!(
            image_style(&layout.image).get("box-shadow"),
            Some("4px 0px 12px 0px #333")
        );
    }

    #[test]
    fn blurred_background_css() {
        let style = StyleOptions::default()
            .with_background_mode(BackgroundMode::BlurredImage)
            .patch("background.blur_clear", Value::Integer(20))
            .unwrap();
        let layout = layout_for(&style);
        let d = background_style(layout.background.as_ref().unwrap(), "photo.jpg");
        assert_eq!(d.get("background-image"), Some("url(\"photo.jpg\")"));
        assert_eq!(d.get("background-size"), Some("cover"));
        assert_eq!(d.get("filter"), Some("blur(15px)"));
        assert_eq!(d.get("opacity"), Some("1.00"));
        assert_eq!(d.get("width"), Some("120%"));
        assert_eq!(d.get("height"), Some("120%"));
        assert_eq!(d.get("left"), Some("-10%"));
        assert_eq!(d.get("top"), Some("-10%"));
        assert_eq!(d.get("background-position-x"), Some("50%"));
    }

    #[test]
    fn background_url_is_quoted_and_escaped() {
        assert_eq!(
            css_url("file:///photos/my%20trip/a.jpg"),
            "url(\"file:///photos/my%20trip/a.jpg\")"
        );
        assert_eq!(css_url(r#"a"b\c.jpg"#), r#"url("a\"b\\c.jpg")"#);
    }

    #[test]
    fn text_block_css_resolves_position() {
        let block = TextBlock {
            top: 50.0,
            left: 10.0,
            italic: true,
            ..TextBlock::default()
        };
        let d = text_block_style(&block, Size { width: 800.0, height: 600.0 });
        assert_eq!(d.get("left"), Some("80px"));
        assert_eq!(d.get("top"), Some("300px"));
        assert_eq!(d.get("font-style"), Some("italic"));
        assert_eq!(d.get("text-shadow"), Some("none"));
        assert_eq!(d.get("white-space"), Some("pre"));
    }

    #[test]
    fn inline_joins_in_order() {
        let mut d = Declarations::default();
        d.push("a", "1");
        d.push("b", "2");
        assert_eq!(d.to_inline(), "a: 1; b: 2");
    }

    // =========================================================================
    // Document
    // =========================================================================

    #[test]
    fn document_contains_blocks_and_items() {
        let style = zero_margins().with_text_blocks(vec![
            TextBlock {
                source: TextSource::Metadata,
                content: TextContent::Sequence(vec!["ISO200".into(), "f/4".into()]),
                ..TextBlock::default()
            },
            TextBlock {
                source: TextSource::Freeform,
                content: TextContent::Single("Kyoto <2024>".into()),
                ..TextBlock::default()
            },
        ]);
        let html = render_document(&layout_for(&style), &style, "p.jpg").into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("id=\"text-block-0\""));
        assert!(html.contains("id=\"text-block-1\""));
        assert!(html.contains(">ISO200</span>"));
        assert!(html.contains("margin-right: 12px"));
        assert!(html.contains("Kyoto &lt;2024&gt;"));
        assert!(!html.contains("canvas-bg"));
    }

    #[test]
    fn freeform_sequence_renders_as_plain_text() {
        let style = zero_margins().with_text_blocks(vec![TextBlock {
            source: TextSource::Freeform,
            content: TextContent::Sequence(vec!["Kyoto".into(), "2024".into()]),
            ..TextBlock::default()
        }]);
        let html = render_document(&layout_for(&style), &style, "p.jpg").into_string();
        assert!(html.contains("Kyoto 2024"));
        assert!(!html.contains("<span"));
    }

    // =========================================================================
    // export()
    // =========================================================================

    #[test]
    fn export_refuses_degenerate_layout() {
        let result = export(
            &HtmlExporter,
            &DerivedLayout::degenerate(),
            &StyleOptions::default(),
            "p.jpg",
        );
        assert!(matches!(result, Err(ExportError::Failed(_))));
    }

    #[test]
    fn export_failure_is_retryable() {
        let exporter = FlakyExporter {
            failures_left: Cell::new(1),
        };
        let style = zero_margins();
        let layout = layout_for(&style);

        let err = export(&exporter, &layout, &style, "p.jpg").unwrap_err();
        assert!(err.is_retryable());
        let bytes = export(&exporter, &layout, &style, "p.jpg").unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn export_request_lists_fonts() {
        let style = zero_margins().with_text_blocks(vec![TextBlock {
            font_family: "en_krone".into(),
            content: TextContent::Single("x".into()),
            ..TextBlock::default()
        }]);
        let request = ExportRequest::new(&layout_for(&style), &style, "p.jpg");
        assert_eq!(request.fonts, vec!["en_krone".to_string()]);
        assert_eq!(request.canvas.width, 1000.0);
    }
}
