//! Encoder parameters shared by the codec and the configuration layer.

/// Quality setting for lossy image encoding (1-100).
///
/// Ignored by lossless encoders (PNG, GIF, TIFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}
