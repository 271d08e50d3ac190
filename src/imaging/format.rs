//! Image types the pipeline can decode and re-encode.
//!
//! An [`ImageType`] is derived from the object key's extension before any I/O
//! happens, and the same type is used to decode the source and to encode every
//! variant, so a variant always keeps its source's format.

use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// A source/variant image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Jpeg,
    Png,
    WebP,
    Gif,
    Tiff,
}

/// Extension table. Matching is case-insensitive; the first entry for a type
/// is its canonical extension.
const EXTENSIONS: &[(&str, ImageType)] = &[
    ("jpg", ImageType::Jpeg),
    ("jpeg", ImageType::Jpeg),
    ("png", ImageType::Png),
    ("webp", ImageType::WebP),
    ("gif", ImageType::Gif),
    ("tif", ImageType::Tiff),
    ("tiff", ImageType::Tiff),
];

impl ImageType {
    /// Look up a type by file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, t)| *t)
    }

    /// MIME type used when neither the store nor the event supplies one.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
            ImageType::WebP => "image/webp",
            ImageType::Gif => "image/gif",
            ImageType::Tiff => "image/tiff",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            ImageType::Jpeg => ImageFormat::Jpeg,
            ImageType::Png => ImageFormat::Png,
            ImageType::WebP => ImageFormat::WebP,
            ImageType::Gif => ImageFormat::Gif,
            ImageType::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Every extension the compiled-in codec can handle.
pub fn known_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS.iter().map(|(e, _)| *e)
}
