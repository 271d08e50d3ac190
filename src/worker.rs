//! Resize worker: one variant from shared source to stored object.
//!
//! A worker resizes the shared decoded source to its plan's dimensions,
//! encodes the result in the source's format, and stores it under the plan's
//! key with the source's content type. Every failure is captured in the
//! returned [`VariantResult`] together with the stage it happened in; a worker
//! never returns an error, so one bad variant cannot cut its siblings short.
//!
//! A plan larger than the worker's pixel limit fails at the resize stage
//! without calling the codec. Allocation failure aborts the process rather
//! than unwinding, so oversized buffers must be refused before they are asked
//! for.

use crate::config::DEFAULT_MAX_OUTPUT_PIXELS;
use crate::imaging::{ImageCodec, ImageType, Quality};
use crate::offload;
use crate::outcome::{Stage, VariantResult, VariantStatus};
use crate::plan::VariantPlan;
use crate::store::ObjectStore;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// Where and how every variant of one invocation is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub bucket: String,
    /// Encoding format; always the source's own format.
    pub format: ImageType,
    /// Content type attached to every upload.
    pub content_type: String,
}

pub struct ResizeWorker<C: ImageCodec> {
    codec: Arc<C>,
    store: Arc<dyn ObjectStore>,
    quality: Quality,
    max_output_pixels: u64,
}

impl<C: ImageCodec> Clone for ResizeWorker<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            store: Arc::clone(&self.store),
            quality: self.quality,
            max_output_pixels: self.max_output_pixels,
        }
    }
}

impl<C: ImageCodec> ResizeWorker<C> {
    pub fn new(codec: Arc<C>, store: Arc<dyn ObjectStore>, quality: Quality) -> Self {
        Self {
            codec,
            store,
            quality,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }

    pub fn with_max_output_pixels(mut self, limit: u64) -> Self {
        self.max_output_pixels = limit;
        self
    }

    /// Produce and store one variant.
    pub async fn run(
        &self,
        source: Arc<C::Handle>,
        plan: VariantPlan,
        destination: &Destination,
    ) -> VariantResult {
        let status = match self.render(source, &plan, destination.format).await {
            Ok(encoded) => self.upload(encoded, &plan, destination).await,
            Err(status) => status,
        };

        match &status {
            VariantStatus::Stored { bytes } => info!(
                bucket = %destination.bucket,
                key = %plan.key,
                width = plan.width,
                height = plan.height,
                bytes,
                "Stored variant"
            ),
            VariantStatus::Failed { stage, cause } => warn!(
                bucket = %destination.bucket,
                key = %plan.key,
                %stage,
                %cause,
                "Variant failed"
            ),
        }

        VariantResult {
            size: plan.size,
            key: plan.key,
            width: plan.width,
            height: plan.height,
            status,
        }
    }

    /// Resize then encode on the CPU pool.
    async fn render(
        &self,
        source: Arc<C::Handle>,
        plan: &VariantPlan,
        format: ImageType,
    ) -> Result<Bytes, VariantStatus> {
        if plan.pixels() > self.max_output_pixels {
            return Err(failed(
                Stage::Resize,
                format!(
                    "output {}x{} exceeds the limit of {} pixels",
                    plan.width, plan.height, self.max_output_pixels
                ),
            ));
        }

        let codec = Arc::clone(&self.codec);
        let (width, height) = (plan.width, plan.height);
        let resized = offload::run(move || codec.resize(&source, width, height))
            .await
            .map_err(|e| failed(Stage::Resize, e))?
            .map_err(|e| failed(Stage::Resize, e))?;

        let codec = Arc::clone(&self.codec);
        let quality = self.quality;
        let encoded = offload::run(move || codec.encode(&resized, format, quality))
            .await
            .map_err(|e| failed(Stage::Encode, e))?
            .map_err(|e| failed(Stage::Encode, e))?;

        Ok(Bytes::from(encoded))
    }

    async fn upload(&self, body: Bytes, plan: &VariantPlan, destination: &Destination) -> VariantStatus {
        let bytes = body.len();
        match self
            .store
            .store(&destination.bucket, &plan.key, body, &destination.content_type)
            .await
        {
            Ok(()) => VariantStatus::Stored { bytes },
            Err(e) => failed(Stage::Store, e),
        }
    }
}

fn failed(stage: Stage, cause: impl std::fmt::Display) -> VariantStatus {
    VariantStatus::Failed {
        stage,
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::codec::tests::{MockCodec, RecordedOp};
    use crate::plan::plan;
    use crate::store::tests::MemoryStore;

    fn destination() -> Destination {
        Destination {
            bucket: "photos-resized".into(),
            format: ImageType::Jpeg,
            content_type: "image/jpeg".into(),
        }
    }

    fn setup(codec: MockCodec, store: MemoryStore) -> (Arc<MockCodec>, Arc<MemoryStore>, ResizeWorker<MockCodec>) {
        let codec = Arc::new(codec);
        let store = Arc::new(store);
        let worker = ResizeWorker::new(Arc::clone(&codec), store.clone(), Quality::new(80));
        (codec, store, worker)
    }

    async fn source(codec: &MockCodec) -> Arc<crate::imaging::codec::tests::MockImage> {
        Arc::new(codec.decode(b"src", ImageType::Jpeg).unwrap())
    }

    #[tokio::test]
    async fn stores_encoded_variant_under_plan_key() {
        let (codec, store, worker) = setup(MockCodec::with_source(4000, 3000), MemoryStore::new());
        let src = source(&codec).await;

        let result = worker
            .run(src, plan(4000, 3000, 120, "sunset.jpg"), &destination())
            .await;

        assert_eq!(result.key, "120_sunset.jpg");
        assert_eq!((result.width, result.height), (160, 120));
        assert_eq!(result.status, VariantStatus::Stored { bytes: 7 });

        let puts = store.get_puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].bucket, "photos-resized");
        assert_eq!(puts[0].key, "120_sunset.jpg");
        assert_eq!(puts[0].content_type, "image/jpeg");
        assert_eq!(puts[0].body, Bytes::from_static(b"160x120"));
    }

    #[tokio::test]
    async fn encodes_in_destination_format_with_quality() {
        let (codec, _store, worker) = setup(MockCodec::with_source(400, 300), MemoryStore::new());
        let src = source(&codec).await;
        let dest = Destination {
            format: ImageType::Png,
            content_type: "image/png".into(),
            ..destination()
        };

        worker.run(src, plan(400, 300, 30, "a.png"), &dest).await;

        let ops = codec.get_operations();
        assert!(ops.contains(&RecordedOp::Resize { width: 40, height: 30 }));
        assert!(ops.contains(&RecordedOp::Encode {
            width: 40,
            height: 30,
            format: ImageType::Png,
            quality: 80,
        }));
    }

    #[tokio::test]
    async fn resize_failure_skips_encode_and_store() {
        let (codec, store, worker) = setup(
            MockCodec::with_source(4000, 3000).fail_resize_at(160, 120),
            MemoryStore::new(),
        );
        let src = source(&codec).await;

        let result = worker
            .run(src, plan(4000, 3000, 120, "sunset.jpg"), &destination())
            .await;

        assert!(matches!(
            result.status,
            VariantStatus::Failed { stage: Stage::Resize, .. }
        ));
        assert!(store.get_puts().is_empty());
        assert!(
            !codec
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Encode { .. }))
        );
    }

    #[tokio::test]
    async fn oversized_plan_fails_before_codec_is_called() {
        let (codec, store, worker) = setup(MockCodec::with_source(1, 20_000), MemoryStore::new());
        let src = source(&codec).await;

        let result = worker
            .run(src, plan(1, 20_000, 1024, "strip.jpg"), &destination())
            .await;

        assert_eq!((result.width, result.height), (1024, 20_480_000));
        match result.status {
            VariantStatus::Failed { stage, cause } => {
                assert_eq!(stage, Stage::Resize);
                assert!(cause.contains("1024x20480000"), "{cause}");
            }
            other => panic!("expected resize failure, got {other:?}"),
        }
        // Only the decode done by the test itself
        assert_eq!(codec.get_operations().len(), 1);
        assert!(store.get_puts().is_empty());
    }

    #[tokio::test]
    async fn pixel_limit_is_configurable() {
        let (codec, store, worker) = setup(MockCodec::with_source(4000, 3000), MemoryStore::new());
        let worker = worker.with_max_output_pixels(160 * 120);
        let src = source(&codec).await;

        let small = worker
            .run(Arc::clone(&src), plan(4000, 3000, 120, "sunset.jpg"), &destination())
            .await;
        let large = worker
            .run(src, plan(4000, 3000, 512, "sunset.jpg"), &destination())
            .await;

        assert!(matches!(small.status, VariantStatus::Stored { .. }));
        assert!(matches!(
            large.status,
            VariantStatus::Failed { stage: Stage::Resize, .. }
        ));
        assert_eq!(store.get_puts().len(), 1);
    }

    #[tokio::test]
    async fn encode_failure_is_reported_with_stage() {
        let (codec, store, worker) = setup(
            MockCodec::with_source(4000, 3000).fail_encode_at(160, 120),
            MemoryStore::new(),
        );
        let src = source(&codec).await;

        let result = worker
            .run(src, plan(4000, 3000, 120, "sunset.jpg"), &destination())
            .await;

        assert!(matches!(
            result.status,
            VariantStatus::Failed { stage: Stage::Encode, .. }
        ));
        assert!(store.get_puts().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_reported_with_cause() {
        let (codec, _store, worker) = setup(
            MockCodec::with_source(4000, 3000),
            MemoryStore::new().fail_put_for("120_sunset.jpg"),
        );
        let src = source(&codec).await;

        let result = worker
            .run(src, plan(4000, 3000, 120, "sunset.jpg"), &destination())
            .await;

        match result.status {
            VariantStatus::Failed { stage, cause } => {
                assert_eq!(stage, Stage::Store);
                assert!(cause.contains("120_sunset.jpg"), "{cause}");
            }
            other => panic!("expected store failure, got {other:?}"),
        }
    }
}
