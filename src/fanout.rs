//! Fan-out orchestration: one decoded source, N concurrent variant workers.
//!
//! Every configured size gets its own [`ResizeWorker`] run. The runs are
//! polled concurrently (capped by `max_concurrency`) and the orchestrator
//! waits for all of them: there is no early exit on the first failure, so a
//! bad variant never prevents its siblings from finishing. Results come back
//! in configuration order and are folded into one [`InvocationOutcome`].
//!
//! The decoded source sits behind an `Arc` and is only ever read; each worker
//! derives its own resized handle from it.

use crate::imaging::{ImageCodec, ImageType};
use crate::outcome::{InvocationOutcome, VariantResult};
use crate::plan::plan_all;
use crate::worker::{Destination, ResizeWorker};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A fetched and decoded source object.
///
/// Immutable once built; owned by one invocation and shared read-only with
/// all of its workers.
pub struct SourceObject<H> {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub format: ImageType,
    pub width: u32,
    pub height: u32,
    pub image: Arc<H>,
}

pub struct FanOut<C: ImageCodec> {
    worker: ResizeWorker<C>,
    max_concurrency: Option<usize>,
}

impl<C: ImageCodec> FanOut<C> {
    /// `max_concurrency` of `None` runs every variant at once.
    pub fn new(worker: ResizeWorker<C>, max_concurrency: Option<usize>) -> Self {
        Self {
            worker,
            max_concurrency,
        }
    }

    /// Produce every configured variant of `source` into `dest_bucket`.
    pub async fn run(
        &self,
        source: &SourceObject<C::Handle>,
        sizes: &[u32],
        dest_bucket: &str,
    ) -> InvocationOutcome {
        let plans = plan_all((source.width, source.height), sizes, &source.key);
        let limit = self.max_concurrency.unwrap_or(plans.len()).max(1);
        let destination = Destination {
            bucket: dest_bucket.to_string(),
            format: source.format,
            content_type: source.content_type.clone(),
        };

        info!(
            key = %source.key,
            variants = plans.len(),
            concurrency = limit,
            "Fanning out variants"
        );

        let results: Vec<VariantResult> = stream::iter(plans)
            .map(|plan| self.worker.run(Arc::clone(&source.image), plan, &destination))
            .buffered(limit)
            .collect()
            .await;

        let outcome = InvocationOutcome::aggregate(destination.bucket, results);
        let failed: Vec<&str> = outcome.failed().map(|v| v.key.as_str()).collect();
        match &outcome {
            InvocationOutcome::Success { bucket, variants } => info!(
                source = %format!("{}/{}", source.bucket, source.key),
                %bucket,
                stored = variants.len(),
                "Successfully resized"
            ),
            InvocationOutcome::PartialFailure { bucket, variants } => warn!(
                source = %format!("{}/{}", source.bucket, source.key),
                %bucket,
                stored = variants.len() - failed.len(),
                ?failed,
                "Some variants failed"
            ),
            InvocationOutcome::TotalFailure { bucket, .. } => error!(
                source = %format!("{}/{}", source.bucket, source.key),
                %bucket,
                ?failed,
                "Every variant failed"
            ),
            InvocationOutcome::Skipped { .. } => {}
        }
        outcome
    }
}
