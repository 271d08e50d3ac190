//! Naming rules shared by the dispatcher and the planner.
//!
//! ## Destination Bucket
//!
//! Variants go to a sibling bucket named after the source bucket plus a
//! configured suffix:
//! - `photos` + `-resized` → `photos-resized`
//!
//! ## Variant Keys
//!
//! Each variant key is the target size, an underscore, and the full source key.
//! Embedding both makes keys unique per size within one invocation, and stable
//! across re-runs, so a retry overwrites rather than duplicates:
//! - `(120, "sunset.jpg")` → `120_sunset.jpg`
//! - `(512, "2024/trip/sunset.jpg")` → `512_2024/trip/sunset.jpg`
//!
//! ## Image Type Classification
//!
//! The type is read from the extension of the key's last path segment and
//! matched case-insensitively against the configured supported set.

use crate::imaging::ImageType;
use crate::outcome::SkipReason;

/// Derive the destination bucket from the source bucket name.
pub fn destination_bucket(source_bucket: &str, suffix: &str) -> String {
    format!("{source_bucket}{suffix}")
}

/// Build the output key for one variant.
pub fn variant_key(size: u32, source_key: &str) -> String {
    format!("{size}_{source_key}")
}

/// Extension of the key's last path segment, without the dot.
///
/// Returns `None` when the segment has no dot or ends with one.
pub fn key_extension(key: &str) -> Option<&str> {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() { None } else { Some(ext) }
}

/// Classify a key into an [`ImageType`] if its extension is supported.
///
/// `supported` holds the configured extensions (e.g. `["jpg", "png"]`).
pub fn classify(key: &str, supported: &[String]) -> Result<ImageType, SkipReason> {
    let ext = key_extension(key).ok_or(SkipReason::MissingExtension)?;
    let unsupported = || SkipReason::UnsupportedType {
        extension: ext.to_string(),
    };

    if !supported.iter().any(|s| s.eq_ignore_ascii_case(ext)) {
        return Err(unsupported());
    }
    ImageType::from_extension(ext).ok_or_else(unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported(exts: &[&str]) -> Vec<String> {
        exts.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // destination_bucket / variant_key
    // =========================================================================

    #[test]
    fn destination_appends_suffix() {
        assert_eq!(destination_bucket("photos", "-resized"), "photos-resized");
    }

    #[test]
    fn destination_with_empty_suffix_equals_source() {
        assert_eq!(destination_bucket("photos", ""), "photos");
    }

    #[test]
    fn variant_key_prefixes_size() {
        assert_eq!(variant_key(120, "sunset.jpg"), "120_sunset.jpg");
    }

    #[test]
    fn variant_key_keeps_path_segments() {
        assert_eq!(
            variant_key(512, "2024/trip/sunset.jpg"),
            "512_2024/trip/sunset.jpg"
        );
    }

    #[test]
    fn variant_keys_distinct_per_size() {
        let keys: Vec<String> = [120, 512, 1024]
            .iter()
            .map(|s| variant_key(*s, "a.png"))
            .collect();
        assert_eq!(keys, vec!["120_a.png", "512_a.png", "1024_a.png"]);
    }

    // =========================================================================
    // key_extension
    // =========================================================================

    #[test]
    fn extension_of_simple_key() {
        assert_eq!(key_extension("sunset.jpg"), Some("jpg"));
    }

    #[test]
    fn extension_uses_last_dot() {
        assert_eq!(key_extension("archive.tar.png"), Some("png"));
    }

    #[test]
    fn extension_ignores_dots_in_directories() {
        assert_eq!(key_extension("v1.2/readme"), None);
        assert_eq!(key_extension("v1.2/photo.png"), Some("png"));
    }

    #[test]
    fn no_extension() {
        assert_eq!(key_extension("sunset"), None);
        assert_eq!(key_extension("sunset."), None);
    }

    // =========================================================================
    // classify
    // =========================================================================

    #[test]
    fn classify_supported() {
        let s = supported(&["jpg", "png"]);
        assert_eq!(classify("a.jpg", &s), Ok(ImageType::Jpeg));
        assert_eq!(classify("a.PNG", &s), Ok(ImageType::Png));
    }

    #[test]
    fn classify_known_but_not_configured() {
        let s = supported(&["jpg", "png"]);
        assert_eq!(
            classify("a.jpeg", &s),
            Err(SkipReason::UnsupportedType {
                extension: "jpeg".into()
            })
        );
    }

    #[test]
    fn classify_non_image() {
        let s = supported(&["jpg", "png"]);
        assert_eq!(
            classify("notes.txt", &s),
            Err(SkipReason::UnsupportedType {
                extension: "txt".into()
            })
        );
    }

    #[test]
    fn classify_missing_extension() {
        let s = supported(&["jpg"]);
        assert_eq!(classify("README", &s), Err(SkipReason::MissingExtension));
    }
}
