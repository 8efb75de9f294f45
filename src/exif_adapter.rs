//! Production metadata adapter.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | EXIF tags (JPEG, TIFF, PNG, HEIF containers) | `kamadak-exif` (`exif::Reader::read_from_container`) |
//! | Header dimensions when EXIF has none | `image::image_dimensions` |
//!
//! Files without an EXIF block are not an error: they fall through to the
//! decoder's header and come back as [`ImageInfo::DimensionsOnly`].

use crate::metadata::{CameraTags, ImageInfo, MetadataAdapter, MetadataError, TagNumber};
use exif::{Exif, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExifAdapter;

impl ExifAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataAdapter for ExifAdapter {
    fn read(&self, path: &Path) -> Result<ImageInfo, MetadataError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let tags = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => camera_tags(&exif),
            Err(exif::Error::NotFound(_)) => CameraTags::default(),
            Err(exif::Error::Io(e)) => return Err(MetadataError::Io(e)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "EXIF block unreadable");
                CameraTags::default()
            }
        };

        let header = image::image_dimensions(path).ok();
        ImageInfo::from_tags(&tags, header)
    }
}

fn camera_tags(exif: &Exif) -> CameraTags {
    CameraTags {
        pixel_x: uint(exif, Tag::PixelXDimension),
        pixel_y: uint(exif, Tag::PixelYDimension),
        image_width: uint(exif, Tag::ImageWidth),
        image_height: uint(exif, Tag::ImageLength),
        orientation: uint(exif, Tag::Orientation).and_then(|o| u16::try_from(o).ok()),
        make: ascii(exif, Tag::Make),
        model: ascii(exif, Tag::Model),
        lens_make: ascii(exif, Tag::LensMake),
        lens_model: ascii(exif, Tag::LensModel),
        f_number: number(exif, Tag::FNumber),
        iso: uint(exif, Tag::PhotographicSensitivity),
        exposure_time: number(exif, Tag::ExposureTime),
        focal_length: number(exif, Tag::FocalLength),
        focal_length_35mm: number(exif, Tag::FocalLengthIn35mmFilm),
        date_time: ascii(exif, Tag::DateTime),
    }
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => {
            let text = String::from_utf8_lossy(parts.first()?)
                .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn number(exif: &Exif, tag: Tag) -> Option<TagNumber> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(values) => values.first().map(|r| TagNumber::Rational(r.num, r.denom)),
        other => match other.get_uint(0) {
            Some(n) => Some(TagNumber::Integer(n)),
            None => Some(TagNumber::Text(field.display_value().to_string())),
        },
    }
}
