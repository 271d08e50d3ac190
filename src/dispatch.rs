//! Event dispatcher: the entry point of one invocation.
//!
//! ## Pipeline
//!
//! ```text
//! event ──► admit (no I/O) ──► fetch ──► decode once ──► fan-out ──► outcome
//!              │
//!              ├─ malformed event        → Err(MalformedEvent)
//!              ├─ unsupported extension  → Ok(Skipped)
//!              └─ source == destination  → Err(Configuration)
//! ```
//!
//! Admission is a pure check over the event and the config: every way an
//! invocation can be rejected up front is decided before the store or codec is
//! touched. Failures before fan-out terminate the invocation as a
//! [`PipelineError`]; failures inside fan-out are recorded per variant in the
//! returned [`InvocationOutcome`].

use crate::config::PipelineConfig;
use crate::event::{EventError, ObjectRef, S3Event};
use crate::fanout::{FanOut, SourceObject};
use crate::imaging::{Dimensions, ImageCodec, ImageType};
use crate::naming;
use crate::offload;
use crate::outcome::InvocationOutcome;
use crate::store::{ObjectStore, StoreError};
use crate::worker::ResizeWorker;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] EventError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("failed to fetch {bucket}/{key}: {source}")]
    FetchFailed {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to decode {key}: {cause}")]
    DecodeFailed { key: String, cause: String },
    #[error("invocation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl PipelineError {
    /// Whether re-delivering the same event could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            PipelineError::FetchFailed { source, .. } => source.is_retriable(),
            PipelineError::DeadlineExceeded(_) => true,
            _ => false,
        }
    }
}

/// An event that passed every up-front check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub object: ObjectRef,
    pub format: ImageType,
    pub dest_bucket: String,
}

/// Result of the admission gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accept(Task),
    Skip(InvocationOutcome),
}

pub struct Dispatcher<C: ImageCodec> {
    codec: Arc<C>,
    store: Arc<dyn ObjectStore>,
    config: PipelineConfig,
}

impl<C: ImageCodec> Dispatcher<C> {
    /// `config` is expected to have passed [`PipelineConfig::validate`].
    pub fn new(codec: Arc<C>, store: Arc<dyn ObjectStore>, config: PipelineConfig) -> Self {
        Self {
            codec,
            store,
            config,
        }
    }

    /// Parse a raw JSON event and handle it.
    pub async fn handle_json(&self, json: &str) -> Result<InvocationOutcome, PipelineError> {
        let event = S3Event::from_json(json).map_err(|e| {
            warn!(error = %e, "Rejecting malformed event");
            PipelineError::from(e)
        })?;
        self.handle(&event).await
    }

    /// Handle one trigger event end to end, within the configured deadline.
    ///
    /// When the deadline passes, in-flight work is dropped. Variants already
    /// stored stay stored.
    pub async fn handle(&self, event: &S3Event) -> Result<InvocationOutcome, PipelineError> {
        match self.config.deadline() {
            Some(limit) => tokio::time::timeout(limit, self.process(event))
                .await
                .map_err(|_| {
                    error!(deadline = ?limit, "Invocation deadline exceeded, abandoning in-flight work");
                    PipelineError::DeadlineExceeded(limit)
                })?,
            None => self.process(event).await,
        }
    }

    /// Decide whether an event is processed, skipped or rejected.
    ///
    /// Performs no I/O.
    pub fn admit(&self, event: &S3Event) -> Result<Admission, PipelineError> {
        let object = event.object().map_err(|e| {
            warn!(error = %e, "Rejecting malformed event");
            PipelineError::from(e)
        })?;
        if event.records.len() > 1 {
            warn!(
                ignored = event.records.len() - 1,
                "Event carries more than one record, processing the first only"
            );
        }

        let dest_bucket = naming::destination_bucket(&object.bucket, &self.config.destination.suffix);

        let format = match naming::classify(&object.key, &self.config.variants.supported_types) {
            Ok(format) => format,
            Err(reason) => {
                info!(
                    bucket = %object.bucket,
                    key = %object.key,
                    %reason,
                    "Skipping object"
                );
                return Ok(Admission::Skip(InvocationOutcome::Skipped {
                    key: object.key,
                    reason,
                }));
            }
        };

        if dest_bucket == object.bucket {
            error!(
                bucket = %object.bucket,
                suffix = %self.config.destination.suffix,
                "Destination bucket equals source bucket"
            );
            return Err(PipelineError::Configuration(format!(
                "destination bucket {dest_bucket:?} equals source bucket"
            )));
        }

        info!(
            bucket = %object.bucket,
            key = %object.key,
            %dest_bucket,
            ?format,
            "Event admitted"
        );
        Ok(Admission::Accept(Task {
            object,
            format,
            dest_bucket,
        }))
    }

    async fn process(&self, event: &S3Event) -> Result<InvocationOutcome, PipelineError> {
        let task = match self.admit(event)? {
            Admission::Accept(task) => task,
            Admission::Skip(outcome) => return Ok(outcome),
        };

        let source = self.load_source(&task).await?;

        let worker = ResizeWorker::new(
            Arc::clone(&self.codec),
            Arc::clone(&self.store),
            self.config.quality(),
        )
        .with_max_output_pixels(self.config.processing.max_output_pixels);
        let fanout = FanOut::new(worker, self.config.processing.max_concurrency);
        Ok(fanout
            .run(&source, &self.config.variants.sizes, &task.dest_bucket)
            .await)
    }

    /// Fetch and decode the source exactly once.
    async fn load_source(&self, task: &Task) -> Result<SourceObject<C::Handle>, PipelineError> {
        let ObjectRef {
            bucket,
            key,
            content_type: event_content_type,
            ..
        } = &task.object;

        let fetched = self.store.fetch(bucket, key).await.map_err(|source| {
            error!(%bucket, %key, error = %source, retriable = source.is_retriable(), "Fetch failed");
            PipelineError::FetchFailed {
                bucket: bucket.clone(),
                key: key.clone(),
                source,
            }
        })?;
        info!(%bucket, %key, bytes = fetched.body.len(), "Fetched source");

        // Stored metadata wins, then the event, then the extension
        let content_type = fetched
            .content_type
            .filter(|ct| !ct.is_empty())
            .or_else(|| event_content_type.clone())
            .unwrap_or_else(|| task.format.mime_type().to_string());

        let decode_failed = |cause: String| {
            error!(%key, %cause, "Decode failed");
            PipelineError::DecodeFailed {
                key: key.clone(),
                cause,
            }
        };
        let codec = Arc::clone(&self.codec);
        let body = fetched.body.clone();
        let format = task.format;
        let image = offload::run(move || codec.decode(&body, format))
            .await
            .map_err(|e| decode_failed(e.to_string()))?
            .map_err(|e| decode_failed(e.to_string()))?;

        let Dimensions { width, height } = self.codec.dimensions(&image);
        info!(%key, width, height, %content_type, "Decoded source");

        Ok(SourceObject {
            bucket: bucket.clone(),
            key: key.clone(),
            body: fetched.body,
            content_type,
            format,
            width,
            height,
            image: Arc::new(image),
        })
    }
}
