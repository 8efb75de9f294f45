//! # exif-frame
//!
//! Layout engine for decorated photo exports: a photo on a canvas with
//! margins, rounded corners, a drop shadow, a solid or image-derived
//! background, and positioned text overlays built from camera metadata or
//! typed by hand.
//!
//! # Architecture
//!
//! Style is an immutable snapshot; layout is a pure function of the snapshot,
//! the photo's pixel size, and the container it must fit into:
//!
//! ```text
//! StyleOptions ──patch──▶ StyleOptions'        (copy-on-write snapshots)
//!      │
//!      ▼
//! compute_layout(container, image, style) ──▶ DerivedLayout
//!      │
//!      ▼
//! render::render_document ──▶ HTML canvas ──▶ Exporter ──▶ bytes
//! ```
//!
//! The interactive session ([`editor::Editor`]) is a single-owner event queue
//! on top of that: style edits are throttled, container resizes debounced,
//! and both end in the same pure recompute.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Scale factor, canvas and photo rect, background layer |
//! | [`style`] | Style snapshot, dotted-path patching, range validation |
//! | [`overlay`] | Text block positions, centering, add/duplicate/remove with caps |
//! | [`schedule`] | Throttle and debounce on an explicit clock |
//! | [`editor`] | Event queue that owns the session state |
//! | [`metadata`] | File acceptance, the metadata adapter contract, field formatting |
//! | [`exif_adapter`] | Production adapter over `kamadak-exif` and `image` |
//! | [`render`] | Inline CSS, Maud document, exporter contract |
//! | [`config`] | `config.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Scalar For Everything
//!
//! Margins are resolved in the photo's own pixels before anything is scaled,
//! so the exported file and the on-screen preview are the same picture at
//! different magnifications. Only the drop shadow escapes the scalar; it is
//! applied at raw pixel size.
//!
//! ## Maud For The Canvas
//!
//! The preview document is built with [Maud](https://maud.lambda.xyz/):
//! compile-time checked markup, auto-escaped text, no template files to ship.
//!
//! ## Metadata Behind A Trait
//!
//! Tag extraction is never done by hand. [`metadata::MetadataAdapter`] is the
//! seam: the CLI uses [`exif_adapter::ExifAdapter`], tests use a mock.

pub mod config;
pub mod editor;
pub mod exif_adapter;
pub mod geometry;
pub mod metadata;
pub mod output;
pub mod overlay;
pub mod render;
pub mod schedule;
pub mod style;

#[cfg(test)]
pub(crate) mod test_helpers;
