//! Variant planning: what to produce for one configured size.
//!
//! A [`VariantPlan`] describes *what* a worker should produce, not *how*. It
//! is derived purely from the source dimensions, the target size and the
//! source key, so planning never touches pixels or the network.

use crate::imaging::cover_fit_dimensions;
use crate::naming::variant_key;

/// Output dimensions and key for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlan {
    /// Configured target size (short edge).
    pub size: u32,
    pub width: u32,
    pub height: u32,
    /// Key in the destination bucket.
    pub key: String,
}

impl VariantPlan {
    /// Output pixel count, in `u64` so extreme aspect ratios cannot overflow.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Plan a single variant.
///
/// The short edge of the output equals `target_size`; the long edge is scaled
/// by the same factor and rounded up (see [`cover_fit_dimensions`]).
pub fn plan(source_width: u32, source_height: u32, target_size: u32, source_key: &str) -> VariantPlan {
    let (width, height) = cover_fit_dimensions((source_width, source_height), target_size);
    VariantPlan {
        size: target_size,
        width,
        height,
        key: variant_key(target_size, source_key),
    }
}

/// Plan every configured size, preserving configuration order.
pub fn plan_all(source: (u32, u32), sizes: &[u32], source_key: &str) -> Vec<VariantPlan> {
    sizes
        .iter()
        .map(|&size| plan(source.0, source.1, size, source_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_does_not_overflow() {
        let p = plan(1, 20_000, 1024, "strip.png");
        assert_eq!((p.width, p.height), (1024, 20_480_000));
        assert_eq!(p.pixels(), 20_971_520_000);
    }

    #[test]
    fn plan_landscape_example() {
        let p = plan(4000, 3000, 512, "sunset.jpg");
        assert_eq!(
            p,
            VariantPlan {
                size: 512,
                width: 683,
                height: 512,
                key: "512_sunset.jpg".into(),
            }
        );
    }

    #[test]
    fn plan_all_matches_reference_sizes() {
        let plans = plan_all((4000, 3000), &[120, 512, 1024], "sunset.jpg");
        let summary: Vec<(u32, u32, &str)> = plans
            .iter()
            .map(|p| (p.width, p.height, p.key.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (160, 120, "120_sunset.jpg"),
                (683, 512, "512_sunset.jpg"),
                (1366, 1024, "1024_sunset.jpg"),
            ]
        );
    }

    #[test]
    fn plan_portrait() {
        let p = plan(3000, 4000, 120, "p.png");
        assert_eq!((p.width, p.height), (120, 160));
    }

    #[test]
    fn plan_is_deterministic() {
        assert_eq!(plan(1234, 567, 89, "k.jpg"), plan(1234, 567, 89, "k.jpg"));
    }

    #[test]
    fn plan_all_keys_unique() {
        let plans = plan_all((640, 480), &[64, 128, 256, 512], "x/y.jpg");
        let mut keys: Vec<&str> = plans.iter().map(|p| p.key.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }
}
