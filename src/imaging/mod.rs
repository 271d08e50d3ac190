//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Dimensions** | `DynamicImage::{width, height}` |
//! | **Resize** | `resize_exact` + Lanczos3 |
//! | **Encode** | per-format encoders from the `image` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Format**: [`ImageType`] and its extension / MIME tables
//! - **Parameters**: encoder settings ([`Quality`])
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]

mod calculations;
pub mod codec;
pub mod format;
mod params;
pub mod rust_codec;

pub use calculations::{cover_fit_dimensions, cover_fit_scale};
pub use codec::{CodecError, Dimensions, ImageCodec};
pub use format::{ImageType, known_extensions};
pub use params::Quality;
pub use rust_codec::RustCodec;
