//! CLI output formatting for invocations and plans.
//!
//! # Output Format
//!
//! ## Invoke
//!
//! ```text
//! photos-resized (partial_failure)
//!     001 120_sunset.jpg 160x120: stored (5120 bytes)
//!     002 512_sunset.jpg 683x512: failed at store: access denied: photos-resized/512_sunset.jpg
//!     003 1024_sunset.jpg 1366x1024: stored (81234 bytes)
//! Stored 2 of 3 variants
//! ```
//!
//! A skipped object prints a single line:
//!
//! ```text
//! notes.txt skipped: unsupported image type: txt
//! ```
//!
//! ## Plan
//!
//! ```text
//! sunset.jpg 4000x3000
//!     001 120_sunset.jpg 160x120 (scale 0.0400)
//!     002 512_sunset.jpg 683x512 (scale 0.1707)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::cover_fit_scale;
use crate::outcome::{InvocationOutcome, VariantResult, VariantStatus};
use crate::plan::VariantPlan;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn variant_line(index: usize, variant: &VariantResult) -> String {
    let status = match &variant.status {
        VariantStatus::Stored { bytes } => format!("stored ({bytes} bytes)"),
        VariantStatus::Failed { stage, cause } => format!("failed at {stage}: {cause}"),
    };
    format!(
        "{}{} {} {}x{}: {}",
        indent(1),
        format_index(index),
        variant.key,
        variant.width,
        variant.height,
        status
    )
}

// ============================================================================
// Invoke
// ============================================================================

/// Format an invocation outcome for display.
pub fn format_outcome(outcome: &InvocationOutcome) -> Vec<String> {
    let bucket = match outcome {
        InvocationOutcome::Skipped { key, reason } => {
            return vec![format!("{key} skipped: {reason}")];
        }
        InvocationOutcome::Success { bucket, .. }
        | InvocationOutcome::PartialFailure { bucket, .. }
        | InvocationOutcome::TotalFailure { bucket, .. } => bucket,
    };

    let variants = outcome.variants();
    let mut lines = Vec::with_capacity(variants.len() + 2);
    lines.push(format!("{bucket} ({})", outcome.status_label()));
    lines.extend(
        variants
            .iter()
            .enumerate()
            .map(|(i, v)| variant_line(i + 1, v)),
    );
    let stored = variants.iter().filter(|v| v.is_stored()).count();
    lines.push(format!("Stored {stored} of {} variants", variants.len()));
    lines
}

pub fn print_outcome(outcome: &InvocationOutcome) {
    for line in format_outcome(outcome) {
        println!("{line}");
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Format the planned variants for one source.
pub fn format_plans(source: (u32, u32), key: &str, plans: &[VariantPlan]) -> Vec<String> {
    let mut lines = vec![format!("{key} {}x{}", source.0, source.1)];
    for (i, plan) in plans.iter().enumerate() {
        lines.push(format!(
            "{}{} {} {}x{} (scale {:.4})",
            indent(1),
            format_index(i + 1),
            plan.key,
            plan.width,
            plan.height,
            cover_fit_scale(source, plan.size)
        ));
    }
    lines
}

pub fn print_plans(source: (u32, u32), key: &str, plans: &[VariantPlan]) {
    for line in format_plans(source, key, plans) {
        println!("{line}");
    }
}

// ============================================================================
// Tests
// ============================================================================
