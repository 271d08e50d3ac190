//! Pure Rust codec built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, TIFF) | `image::load_from_memory_with_format` |
//! | Dimensions | `DynamicImage::width` / `height` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality-aware) |
//! | Encode → others | `DynamicImage::write_to` |
//!
//! Decoding is done from the in-memory payload. No temp files are written, so
//! concurrent invocations in one process cannot clobber each other.

use super::codec::{CodecError, Dimensions, ImageCodec};
use super::format::ImageType;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use std::io::Cursor;

/// Codec backed by the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec {
    filter: FilterType,
}

impl RustCodec {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// JPEG has no alpha channel and only 8-bit samples.
fn jpeg_compatible(img: &DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img.clone(),
        ColorType::La8 | ColorType::L16 | ColorType::La16 => DynamicImage::ImageLuma8(img.to_luma8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

/// The WebP and GIF encoders only accept 8-bit RGB(A).
fn rgba_compatible(img: &DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => img.clone(),
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}

impl ImageCodec for RustCodec {
    type Handle = DynamicImage;

    fn decode(&self, bytes: &[u8], format: ImageType) -> Result<DynamicImage, CodecError> {
        let img = image::load_from_memory_with_format(bytes, format.image_format())
            .map_err(|e| CodecError::Decode(format!("not a valid {format:?} image: {e}")))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(CodecError::Decode("image has a zero dimension".to_string()));
        }
        Ok(img)
    }

    fn dimensions(&self, handle: &DynamicImage) -> Dimensions {
        Dimensions {
            width: handle.width(),
            height: handle.height(),
        }
    }

    fn resize(
        &self,
        handle: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::Resize(format!(
                "invalid target size {width}x{height}"
            )));
        }
        Ok(handle.resize_exact(width, height, self.filter))
    }

    fn encode(
        &self,
        handle: &DynamicImage,
        format: ImageType,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        match format {
            ImageType::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
                jpeg_compatible(handle)
                    .write_with_encoder(encoder)
                    .map_err(|e| CodecError::Encode(format!("JPEG encode failed: {e}")))?;
            }
            ImageType::WebP | ImageType::Gif => {
                rgba_compatible(handle)
                    .write_to(&mut Cursor::new(&mut buf), format.image_format())
                    .map_err(|e| CodecError::Encode(format!("{format:?} encode failed: {e}")))?;
            }
            ImageType::Png | ImageType::Tiff => {
                handle
                    .write_to(&mut Cursor::new(&mut buf), format.image_format())
                    .map_err(|e| CodecError::Encode(format!("{format:?} encode failed: {e}")))?;
            }
        }
        Ok(buf)
    }
}
