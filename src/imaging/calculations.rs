//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` uniformly so its short edge equals `target` (cover-fit).
///
/// The short edge is pinned to exactly `target`. The long edge is
/// `ceil(target * long / short)`, computed in integer arithmetic so the result
/// never falls below `target` on either side and never picks up float error.
/// The image is upscaled when the source short edge is smaller than `target`.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height), both non-zero
/// * `target` - Required length of the short edge in pixels
///
/// # Returns
/// * `(width, height)` - Output dimensions
///
/// # Examples
/// ```
/// # use bucket_thumbs::imaging::cover_fit_dimensions;
/// // 4000x3000 landscape, short edge 1024 → 1366x1024
/// assert_eq!(cover_fit_dimensions((4000, 3000), 1024), (1366, 1024));
///
/// // 3000x4000 portrait, short edge 120 → 120x160
/// assert_eq!(cover_fit_dimensions((3000, 4000), 120), (120, 160));
/// ```
pub fn cover_fit_dimensions(source: (u32, u32), target: u32) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));

    if src_w >= src_h {
        // Landscape or square: height is the short edge
        (scale_long_edge(src_w, src_h, target), target)
    } else {
        // Portrait: width is the short edge
        (target, scale_long_edge(src_h, src_w, target))
    }
}

/// `ceil(target * long / short)`, saturating at `u32::MAX`.
fn scale_long_edge(long: u32, short: u32, target: u32) -> u32 {
    let numerator = u64::from(target) * u64::from(long);
    let short = u64::from(short);
    let scaled = numerator.div_ceil(short);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// The uniform scale factor `max(target / w, target / h)` applied by
/// [`cover_fit_dimensions`]. Used for logging only.
pub fn cover_fit_scale(source: (u32, u32), target: u32) -> f64 {
    let (w, h) = (f64::from(source.0.max(1)), f64::from(source.1.max(1)));
    let t = f64::from(target);
    (t / w).max(t / h)
}
