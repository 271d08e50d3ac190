//! Per-variant results and the aggregate outcome of one invocation.
//!
//! These types are what the invoking runtime sees. They serialize to JSON so
//! the binary can hand them back verbatim:
//!
//! ```text
//! {"status":"partial_failure","bucket":"photos-resized","variants":[
//!   {"size":120,"key":"120_sunset.jpg","width":160,"height":120,"status":"stored","bytes":5120},
//!   {"size":512,"key":"512_sunset.jpg","width":683,"height":512,"status":"failed","stage":"store","cause":"..."}
//! ]}
//! ```

use serde::Serialize;
use std::fmt;

/// Why an invocation was skipped without doing any work.
///
/// A skip is a deliberate no-op and counts as success for the runtime, so
/// non-image uploads are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingExtension,
    UnsupportedType { extension: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingExtension => write!(f, "image type unrecognizable (no extension)"),
            SkipReason::UnsupportedType { extension } => {
                write!(f, "unsupported image type: {extension}")
            }
        }
    }
}

/// Pipeline stage at which a variant failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resize,
    Encode,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Resize => "resize",
            Stage::Encode => "encode",
            Stage::Store => "store",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantStatus {
    /// Uploaded; `bytes` is the encoded payload size.
    Stored { bytes: usize },
    Failed { stage: Stage, cause: String },
}

/// Result of one resize worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantResult {
    /// Configured target size this variant was built for.
    pub size: u32,
    /// Output key in the destination bucket.
    pub key: String,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub status: VariantStatus,
}

impl VariantResult {
    pub fn is_stored(&self) -> bool {
        matches!(self.status, VariantStatus::Stored { .. })
    }
}

/// Terminal value of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// Every variant was stored.
    Success {
        bucket: String,
        variants: Vec<VariantResult>,
    },
    /// Some, but not all, variants failed.
    PartialFailure {
        bucket: String,
        variants: Vec<VariantResult>,
    },
    /// No variant was stored.
    TotalFailure {
        bucket: String,
        variants: Vec<VariantResult>,
    },
    /// The object is not a supported image; nothing was fetched or stored.
    Skipped { key: String, reason: SkipReason },
}

impl InvocationOutcome {
    /// Fold per-variant results into an overall status.
    ///
    /// An empty result list counts as success.
    pub fn aggregate(bucket: String, variants: Vec<VariantResult>) -> Self {
        let stored = variants.iter().filter(|v| v.is_stored()).count();
        if stored == variants.len() {
            InvocationOutcome::Success { bucket, variants }
        } else if stored == 0 {
            InvocationOutcome::TotalFailure { bucket, variants }
        } else {
            InvocationOutcome::PartialFailure { bucket, variants }
        }
    }

    /// Whether the runtime should mark the invocation failed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            InvocationOutcome::PartialFailure { .. } | InvocationOutcome::TotalFailure { .. }
        )
    }

    /// Per-variant results (empty for a skip).
    pub fn variants(&self) -> &[VariantResult] {
        match self {
            InvocationOutcome::Success { variants, .. }
            | InvocationOutcome::PartialFailure { variants, .. }
            | InvocationOutcome::TotalFailure { variants, .. } => variants,
            InvocationOutcome::Skipped { .. } => &[],
        }
    }

    /// Variants that did not make it to the store.
    pub fn failed(&self) -> impl Iterator<Item = &VariantResult> {
        self.variants().iter().filter(|v| !v.is_stored())
    }

    /// Short status label, matching the serialized `status` tag.
    pub fn status_label(&self) -> &'static str {
        match self {
            InvocationOutcome::Success { .. } => "success",
            InvocationOutcome::PartialFailure { .. } => "partial_failure",
            InvocationOutcome::TotalFailure { .. } => "total_failure",
            InvocationOutcome::Skipped { .. } => "skipped",
        }
    }
}
