//! Photo metadata: what the layout engine needs from an uploaded file.
//!
//! Reading the file is delegated to a [`MetadataAdapter`]; the production one
//! is [`ExifAdapter`](crate::exif_adapter::ExifAdapter). This module owns the
//! contract around it:
//!
//! - **File acceptance**: only `jpeg`, `png`, `tiff`, `heic` and `heif` are
//!   accepted, checked before any extraction is attempted.
//! - **Result shapes**: [`ImageInfo::Full`] when the camera fields are present,
//!   [`ImageInfo::DimensionsOnly`] when only pixel size could be read. The
//!   latter is not an error, but metadata-sourced text is unavailable, so
//!   callers should confirm with the user before continuing
//!   ([`ImageInfo::needs_confirmation`]).
//! - **Field formatting**: adapters hand over raw [`CameraTags`];
//!   [`ImageInfo::from_tags`] turns them into display strings.
//!
//! ## Fields
//!
//! | Key | Source tag | Example |
//! |---|---|---|
//! | `make` | Make | `SONY` |
//! | `model` | Model | `ILCE-7M4` |
//! | `lens_make` | LensMake | `Sigma` |
//! | `lens_model` | LensModel | `35mm F1.4 DG DN` |
//! | `f_number` | FNumber | `f/1.8` |
//! | `iso` | ISOSpeedRatings | `ISO400` |
//! | `exposure_time` | ExposureTime | `1/250s` |
//! | `focal_length` | FocalLength | `35mm` |
//! | `focal_length_35mm` | FocalLengthIn35mmFilm | `52mm` |
//! | `date_time` | DateTime | `2024:05:01 18:22:09` |

use crate::geometry::{ImageDimensions, round_to};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Image kinds accepted for upload, after stripping any `image/` prefix.
pub const ACCEPTED_KINDS: &[&str] = &["jpeg", "png", "tiff", "heic", "heif"];

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("unrecognized image format: {0}")]
    UnsupportedKind(String),
    #[error("cannot read image information: {0}")]
    Unreadable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accept or reject a declared file kind (`image/jpeg`, `PNG`, `heic`, …).
pub fn accept_kind(declared: &str) -> Result<&'static str, MetadataError> {
    let lowered = declared.trim().to_ascii_lowercase();
    let kind = lowered.strip_prefix("image/").unwrap_or(&lowered);
    ACCEPTED_KINDS
        .iter()
        .find(|k| **k == kind)
        .copied()
        .ok_or_else(|| MetadataError::UnsupportedKind(declared.to_string()))
}

/// Declared kind for a path, derived from its extension.
pub fn kind_from_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "jpg" => "jpeg".to_string(),
        "tif" => "tiff".to_string(),
        _ => ext,
    })
}

/// One displayable metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataField {
    /// Human label, e.g. "Aperture".
    pub name: String,
    /// Formatted value, e.g. "f/1.8".
    pub value: String,
    /// Stable identifier, e.g. "f_number".
    pub key: String,
}

impl MetadataField {
    fn new(key: &str, name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            key: key.to_string(),
        }
    }
}

/// A numeric tag as stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub enum TagNumber {
    Rational(u32, u32),
    Integer(u32),
    /// Anything the adapter could only describe as text.
    Text(String),
}

/// Raw tag values an adapter extracted, before formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraTags {
    pub pixel_x: Option<u32>,
    pub pixel_y: Option<u32>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub orientation: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub f_number: Option<TagNumber>,
    pub iso: Option<u32>,
    pub exposure_time: Option<TagNumber>,
    pub focal_length: Option<TagNumber>,
    pub focal_length_35mm: Option<TagNumber>,
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageInfo {
    /// Pixel size known, camera metadata missing.
    DimensionsOnly { width: u32, height: u32 },
    Full {
        width: u32,
        height: u32,
        orientation: Option<u16>,
        fields: Vec<MetadataField>,
    },
}

impl ImageInfo {
    /// Build the result shape from raw tags.
    ///
    /// Dimensions come from `PixelXDimension`/`PixelYDimension`, then
    /// `ImageWidth`/`ImageLength`, then `header` (the decoder's own view).
    /// Full metadata requires both a camera make and an ISO value.
    pub fn from_tags(
        tags: &CameraTags,
        header: Option<(u32, u32)>,
    ) -> Result<ImageInfo, MetadataError> {
        let exif_dims = tags
            .pixel_x
            .zip(tags.pixel_y)
            .or(tags.image_width.zip(tags.image_height))
            .filter(|&(w, h)| w > 0 && h > 0);

        let Some((width, height)) = exif_dims.or(header.filter(|&(w, h)| w > 0 && h > 0)) else {
            return Err(MetadataError::Unreadable(
                "no pixel dimensions found".to_string(),
            ));
        };

        if tags.make.is_none() || tags.iso.is_none() {
            return Ok(ImageInfo::DimensionsOnly { width, height });
        }

        Ok(ImageInfo::Full {
            width,
            height,
            orientation: tags.orientation,
            fields: format_fields(tags),
        })
    }

    /// Pixel size with orientation applied.
    pub fn dimensions(&self) -> ImageDimensions {
        match self {
            ImageInfo::DimensionsOnly { width, height } => ImageDimensions::new(*width, *height),
            ImageInfo::Full {
                width,
                height,
                orientation,
                ..
            } => ImageDimensions::oriented(*width, *height, *orientation),
        }
    }

    pub fn fields(&self) -> &[MetadataField] {
        match self {
            ImageInfo::DimensionsOnly { .. } => &[],
            ImageInfo::Full { fields, .. } => fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&MetadataField> {
        self.fields().iter().find(|f| f.key == key)
    }

    /// True for dimensions-only results: editing can continue, but only with
    /// freeform text.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, ImageInfo::DimensionsOnly { .. })
    }
}

/// Source of [`ImageInfo`] for a file on disk.
pub trait MetadataAdapter: Sync {
    fn read(&self, path: &Path) -> Result<ImageInfo, MetadataError>;
}

/// The upload flow: check the file kind, then extract.
pub fn load(adapter: &impl MetadataAdapter, path: &Path) -> Result<ImageInfo, MetadataError> {
    let declared = kind_from_path(path).unwrap_or_default();
    accept_kind(&declared)?;
    let info = adapter.read(path)?;
    if info.needs_confirmation() {
        tracing::warn!(path = %path.display(), "camera metadata unavailable; dimensions only");
    }
    Ok(info)
}

/// Integers stay as they are; anything else is rounded to one decimal.
pub fn number_fix(value: f64) -> f64 {
    if value.fract() == 0.0 {
        value
    } else {
        round_to(value, 1)
    }
}

/// Render a numeric tag with an optional unit suffix (`35mm`, `1.8`).
pub fn format_number(tag: &TagNumber, unit: &str) -> String {
    match tag {
        TagNumber::Rational(num, den) if *den != 0 => {
            format!("{}{unit}", number_fix(*num as f64 / *den as f64))
        }
        TagNumber::Rational(num, _) => format!("{num}{unit}"),
        TagNumber::Integer(n) => format!("{n}{unit}"),
        TagNumber::Text(text) => match text.strip_suffix(&format!(" {unit}")) {
            Some(bare) if !unit.is_empty() => format!("{bare}{unit}"),
            _ => text.clone(),
        },
    }
}

/// Exposure times under a second read as fractions: `1/250`.
pub fn format_exposure(tag: &TagNumber) -> String {
    match tag {
        TagNumber::Rational(num, den) if *num != 0 && *den != 0 && num < den => {
            format!("1/{}", number_fix(*den as f64 / *num as f64))
        }
        other => format_number(other, ""),
    }
}

fn format_fields(tags: &CameraTags) -> Vec<MetadataField> {
    let mut fields = Vec::new();
    let mut push = |key: &str, name: &str, value: Option<String>| {
        if let Some(value) = value {
            fields.push(MetadataField::new(key, name, value));
        }
    };

    push("make", "Camera make", tags.make.clone());
    push("model", "Camera model", tags.model.clone());
    push("lens_make", "Lens make", tags.lens_make.clone());
    push("lens_model", "Lens model", tags.lens_model.clone());
    push(
        "f_number",
        "Aperture",
        tags.f_number.as_ref().map(|f| format!("f/{}", format_number(f, ""))),
    );
    push("iso", "ISO", tags.iso.map(|iso| format!("ISO{iso}")));
    push(
        "exposure_time",
        "Shutter speed",
        tags.exposure_time.as_ref().map(|e| format!("{}s", format_exposure(e))),
    );
    push(
        "focal_length",
        "Focal length",
        tags.focal_length.as_ref().map(|f| format_number(f, "mm")),
    );
    push(
        "focal_length_35mm",
        "35mm equivalent",
        tags.focal_length_35mm.as_ref().map(|f| format_number(f, "mm")),
    );
    push("date_time", "Date taken", tags.date_time.clone());

    fields
}
