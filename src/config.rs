//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging the pipeline's `config.toml`.
//! Configuration is loaded once at process start: stock defaults are
//! overridden by an optional user file named with `--config` or the
//! `BUCKET_THUMBS_CONFIG` environment variable.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [destination]
//! suffix = "-resized"                # Destination bucket = source bucket + suffix
//!
//! [variants]
//! sizes = [120, 512, 1024]           # Short-edge targets, one variant each
//! supported_types = ["jpg", "png"]   # Extensions that are resized; others are skipped
//! quality = 90                       # Lossy encoder quality (1-100)
//!
//! [processing]
//! max_concurrency = 3                # Max variants in flight (omit for all at once)
//! max_threads = 4                    # CPU pool size (omit for auto = CPU cores)
//! deadline_secs = 60                 # Abandon the invocation after this long
//! max_output_pixels = 100000000      # Largest variant (width x height) ever allocated
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, override just the values you want:
//!
//! ```toml
//! [variants]
//! sizes = [64, 256]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{ImageType, Quality, known_extensions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Destination bucket naming.
    pub destination: DestinationConfig,
    /// Which variants to produce and from which source types.
    pub variants: VariantsConfig,
    /// Concurrency and deadline settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let variants = &self.variants;
        if variants.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "variants.sizes must not be empty".into(),
            ));
        }
        if variants.sizes.contains(&0) {
            return Err(ConfigError::Validation(
                "variants.sizes values must be positive".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = variants.sizes.iter().find(|s| !seen.insert(**s)) {
            return Err(ConfigError::Validation(format!(
                "variants.sizes contains {dup} more than once"
            )));
        }

        if variants.supported_types.is_empty() {
            return Err(ConfigError::Validation(
                "variants.supported_types must not be empty".into(),
            ));
        }
        if let Some(unknown) = variants
            .supported_types
            .iter()
            .find(|ext| ImageType::from_extension(ext).is_none())
        {
            let known: Vec<&str> = known_extensions().collect();
            return Err(ConfigError::Validation(format!(
                "variants.supported_types: unknown image type {unknown:?} (known: {})",
                known.join(", ")
            )));
        }

        if !(1..=100).contains(&variants.quality) {
            return Err(ConfigError::Validation(
                "variants.quality must be 1-100".into(),
            ));
        }

        if self.processing.max_concurrency == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_concurrency must be at least 1".into(),
            ));
        }
        if self.processing.deadline_secs == Some(0) {
            return Err(ConfigError::Validation(
                "processing.deadline_secs must be at least 1".into(),
            ));
        }
        if self.processing.max_output_pixels == 0 {
            return Err(ConfigError::Validation(
                "processing.max_output_pixels must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Encoder quality as the codec parameter type.
    pub fn quality(&self) -> Quality {
        Quality::new(self.variants.quality)
    }

    /// Invocation deadline, if one is configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.processing.deadline_secs.map(Duration::from_secs)
    }
}

/// Destination bucket naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestinationConfig {
    /// Appended to the source bucket name to form the destination bucket.
    /// An empty suffix makes both buckets equal, which every invocation
    /// rejects as a configuration error.
    pub suffix: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            suffix: "-resized".to_string(),
        }
    }
}

/// Variant generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    /// Short-edge target sizes, in the order results are reported.
    pub sizes: Vec<u32>,
    /// File extensions (without dot, any case) that get resized.
    pub supported_types: Vec<String>,
    /// Encoder quality for lossy formats.
    pub quality: u32,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            sizes: vec![120, 512, 1024],
            supported_types: vec!["jpg".to_string(), "png".to_string()],
            quality: 90,
        }
    }
}

/// Concurrency, deadline and allocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of variants processed at once.
    /// When absent, every configured size runs concurrently.
    pub max_concurrency: Option<usize>,
    /// Size of the CPU pool used for decode, resize and encode.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
    /// Invocation deadline in seconds. When absent, no deadline is enforced
    /// beyond the invoking runtime's own.
    pub deadline_secs: Option<u64>,
    /// Upper bound on `width * height` of any variant. Larger plans fail at
    /// the resize stage before any pixel buffer is allocated.
    pub max_output_pixels: u64,
}

/// 100 megapixels: a 10000x10000 RGBA buffer is 400 MB.
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 100_000_000;

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            max_threads: None,
            deadline_secs: None,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

/// Resolve the effective CPU pool size from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the pipeline config.
///
/// `None` yields the validated stock defaults. A path that does not exist is
/// an error: a named config file is never silently ignored.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# bucket-thumbs Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Point the pipeline at this file with --config or BUCKET_THUMBS_CONFIG.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Destination
# ---------------------------------------------------------------------------
[destination]
# Appended to the source bucket name to form the destination bucket.
# Must not be empty: writing variants into the source bucket would
# re-trigger the pipeline on its own output.
suffix = "-resized"

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
[variants]
# Short-edge targets in pixels. Each size produces "{size}_{key}" in the
# destination bucket, scaled so the shorter side equals the size and the
# aspect ratio is kept.
sizes = [120, 512, 1024]

# Source extensions that are resized (case-insensitive).
# Known: jpg, jpeg, png, webp, gif, tif, tiff. Anything else is skipped.
supported_types = ["jpg", "png"]

# Encoder quality for lossy formats (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum variants processed at once.
# Omit to run every configured size concurrently.
# max_concurrency = 3

# CPU pool size for decode, resize and encode.
# Omit to auto-detect (= number of CPU cores).
# max_threads = 4

# Abandon the invocation after this many seconds. Variants already stored
# stay stored. Omit to rely on the invoking runtime's own timeout.
# deadline_secs = 60

# Largest variant, in pixels (width x height), that will be allocated.
# A variant above this fails at the resize stage while its siblings are
# still produced. Protects against extreme aspect ratios, e.g. a 1x20000
# source planned at short edge 1024 would need 1024x20480000.
max_output_pixels = 100000000
"##
}
