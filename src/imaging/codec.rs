//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the four operations the pipeline needs:
//! decode, dimensions, resize, and encode.
//!
//! Decoding happens exactly once per invocation. The decoded handle is then
//! shared read-only (behind an `Arc`) by every variant worker, and `resize`
//! always produces a new, independently owned handle. Nothing mutates the
//! source handle, so concurrent workers need no locking.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), built on the `image` crate.

use super::format::ImageType;
use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("resize failed: {0}")]
    Resize(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codecs.
///
/// Implementations must be shareable across threads: the same codec value is
/// used by every concurrently running variant worker.
pub trait ImageCodec: Send + Sync + 'static {
    /// Decoded image representation. Read-only once produced.
    type Handle: Send + Sync + 'static;

    /// Decode `bytes` as an image of the claimed `format`.
    fn decode(&self, bytes: &[u8], format: ImageType) -> Result<Self::Handle, CodecError>;

    /// Pixel dimensions of a decoded image.
    fn dimensions(&self, handle: &Self::Handle) -> Dimensions;

    /// Produce a new handle scaled to exactly `width` x `height`.
    fn resize(
        &self,
        handle: &Self::Handle,
        width: u32,
        height: u32,
    ) -> Result<Self::Handle, CodecError>;

    /// Encode a handle into `format`. `quality` applies to lossy formats only.
    fn encode(
        &self,
        handle: &Self::Handle,
        format: ImageType,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;
}
